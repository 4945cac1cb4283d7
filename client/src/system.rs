//! Platform facade: stable machine identity and browser launch.
//!
//! Both operations are thin wrappers over platform primitives. The machine
//! identifier must be stable per install; it is treated as opaque everywhere
//! else in the crate and only ever compared for byte equality.

use {crate::error::Error, log::debug};

/// Stable per-install machine identifier.
///
/// Windows reads `HKLM\SOFTWARE\Microsoft\Cryptography\MachineGuid`; Linux
/// reads `/etc/machine-id` (with the dbus path as fallback); macOS queries
/// the `IOPlatformUUID`.
pub(crate) fn hwid() -> Result<String, Error> {
    let id = imp::hwid().ok_or(Error::FailedToGetHwid)?;
    debug!("machine identifier: {id}");
    Ok(id)
}

/// Open the user's default browser at `url`.
///
/// Fire-and-forget: the opener process is spawned detached and never waited
/// on, so this cannot block the caller.
pub(crate) fn open_browser(url: &str) -> Result<(), Error> {
    debug!("opening browser at {url}");
    imp::open_browser(url).map_err(|_| Error::FailedToOpenBrowser)
}

#[cfg(windows)]
mod imp {
    use {
        std::{io, process::Command},
        winreg::{enums::HKEY_LOCAL_MACHINE, RegKey},
    };

    pub(super) fn hwid() -> Option<String> {
        let key = RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey("SOFTWARE\\Microsoft\\Cryptography")
            .ok()?;
        key.get_value::<String, _>("MachineGuid").ok()
    }

    pub(super) fn open_browser(url: &str) -> io::Result<()> {
        // `start` is a cmd builtin; the empty string is its window title.
        Command::new("cmd").args(["/C", "start", "", url]).spawn()?;
        Ok(())
    }
}

#[cfg(target_os = "macos")]
mod imp {
    use std::{io, process::Command};

    pub(super) fn hwid() -> Option<String> {
        let output = Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()?;

        let text = String::from_utf8_lossy(&output.stdout);
        text.lines()
            .find(|line| line.contains("IOPlatformUUID"))
            .and_then(|line| line.split('"').nth(3))
            .map(str::to_owned)
    }

    pub(super) fn open_browser(url: &str) -> io::Result<()> {
        Command::new("open").arg(url).spawn()?;
        Ok(())
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
mod imp {
    use std::{fs, io, process::Command};

    pub(super) fn hwid() -> Option<String> {
        ["/etc/machine-id", "/var/lib/dbus/machine-id"]
            .iter()
            .find_map(|path| {
                let id = fs::read_to_string(path).ok()?;
                let id = id.trim();
                (!id.is_empty()).then(|| id.to_owned())
            })
    }

    pub(super) fn open_browser(url: &str) -> io::Result<()> {
        Command::new("xdg-open").arg(url).spawn()?;
        Ok(())
    }
}
