use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};

use crate::shutdown::ShutdownSignal;

/// What should we do when the user stops
/// this program?
pub fn handle_shutdown(shutdown: ShutdownSignal) -> std::io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    std::thread::spawn(move || {
        for signal in signals.forever() {
            if shutdown.is_fired() {
                log::debug!("Ignoring signal {signal}, shutdown already requested");
                continue;
            }
            let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Stopping]);
            log::warn!("Received signal {signal}, stopping log relay");
            shutdown.fire();
        }
    });

    Ok(())
}
