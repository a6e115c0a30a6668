use std::{io, path::Path, process::Command};

/// Opens `path` with the platform's default browser.
pub fn open(path: &Path) -> io::Result<()> {
    let url = format!("file://{}", path.canonicalize()?.display());
    command(&url).spawn()?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(target_os = "windows")]
fn command(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", url]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}
