//! Gateway credentials read from mounted secret files.

use std::io;
use std::path::Path;

use idler_core::Credentials;
use tracing::warn;

/// File holding the basic-auth username.
pub const USER_FILE: &str = "basic-auth-user";
/// File holding the basic-auth password.
pub const PASSWORD_FILE: &str = "basic-auth-password";

/// Load gateway credentials from `dir`.
///
/// Contents are trimmed. A missing or unreadable file yields an empty
/// value; the gateway then rejects calls, which surfaces as a failed cycle.
pub fn load_credentials(dir: &Path) -> Credentials {
    let username = read_secret(dir, USER_FILE);
    let password = read_secret(dir, PASSWORD_FILE);
    Credentials::new(username, password)
}

fn read_secret(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(contents) => contents.trim().to_string(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "secret file not found, using empty value");
            String::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read secret file, using empty value");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_trims_both_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(USER_FILE), "admin\n").unwrap();
        std::fs::write(dir.path().join(PASSWORD_FILE), "  s3cret \r\n").unwrap();

        let creds = load_credentials(dir.path());
        assert_eq!(creds, Credentials::new("admin", "s3cret"));
    }

    #[test]
    fn missing_files_give_empty_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(USER_FILE), "admin").unwrap();

        let creds = load_credentials(dir.path());
        assert_eq!(creds, Credentials::new("admin", ""));
    }

    #[test]
    fn missing_directory_gives_empty_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let creds = load_credentials(&dir.path().join("nope"));
        assert!(creds.is_empty());
    }
}
