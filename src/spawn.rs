use crate::errors::WmResult;
use log::{debug, warn};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use nix::unistd::setsid;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

/// Children are never waited for; the kernel reaps them.
pub fn ignore_children() -> WmResult<()> {
    let action = SigAction::new(
        SigHandler::SigIgn,
        SaFlags::SA_NOCLDSTOP | SaFlags::SA_NOCLDWAIT | SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGCHLD, &action) }.map_err(std::io::Error::from)?;
    Ok(())
}

/// Starts `argv` in its own session so it outlives the window manager.
pub fn spawn(argv: &[String]) -> WmResult<()> {
    let Some((program, args)) = argv.split_first() else {
        warn!("refusing to spawn an empty command");
        return Ok(());
    };

    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    unsafe {
        command.pre_exec(|| {
            let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
            sigaction(Signal::SIGCHLD, &default).map_err(std::io::Error::from)?;
            setsid().map_err(std::io::Error::from)?;
            Ok(())
        });
    }

    let child = command.spawn()?;
    debug!("spawned {:?} as pid {}", argv, child.id());
    Ok(())
}

pub fn spawn_shell(command: &str) -> WmResult<()> {
    spawn(&["sh".to_string(), "-c".to_string(), command.to_string()])
}
