//! Error helper functions for creating actionable error messages

use crate::error::Error;
use std::io;
use std::path::Path;

/// Check if an IO error is a permission denied error
pub fn is_permission_denied(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// Check if an IO error is a "not found" error
pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Create an enhanced error message for file permission issues
pub fn permission_error(path: &Path, operation: &str) -> String {
    let parent_dir = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());

    format!(
        "Permission denied when {} '{}'\n\n\
         Possible fixes:\n\
         1. Check file permissions: ls -l '{}'\n\
         2. mdtrim writes through a temp file, so the directory needs write access: chmod u+w '{}'\n\
         3. For backup operations: use --backup-dir to pick a writable location",
        operation,
        path.display(),
        path.display(),
        parent_dir
    )
}

/// Create an enhanced error message for file not found issues
pub fn not_found_error(path: &Path) -> String {
    format!(
        "File not found: '{}'\n\n\
         Possible fixes:\n\
         1. Check the file path is correct\n\
         2. Pass the file explicitly: mdtrim path/to/README.md\n\
         3. Set [target] path in the config file (see: mdtrim config --path)",
        path.display()
    )
}

/// Create an enhanced error message for non-UTF-8 input
pub fn decode_error(path: &Path, valid_up_to: usize) -> String {
    format!(
        "'{}' is not valid UTF-8 (first invalid byte at offset {})\n\n\
         Possible fixes:\n\
         1. Check the encoding: file -i '{}'\n\
         2. Convert it first: iconv -f <encoding> -t UTF-8 '{}'",
        path.display(),
        valid_up_to,
        path.display(),
        path.display()
    )
}

/// Actionable hint for a core error, if one applies
pub fn hint_for(err: &Error, operation: &str) -> Option<String> {
    match err {
        Error::Io { path, source } if is_permission_denied(source) => {
            Some(permission_error(path, operation))
        }
        Error::Io { path, source } if is_not_found(source) => Some(not_found_error(path)),
        Error::Decode { path, source } => {
            Some(decode_error(path, source.utf8_error().valid_up_to()))
        }
        _ => None,
    }
}

/// Wrap a core error for reporting, attaching a hint when there is one
pub fn explain(err: Error, operation: &str) -> anyhow::Error {
    match hint_for(&err, operation) {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => anyhow::Error::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use std::path::PathBuf;

    #[test]
    fn test_is_permission_denied() {
        let perm_err = io::Error::new(ErrorKind::PermissionDenied, "access denied");
        assert!(is_permission_denied(&perm_err));

        let not_found_err = io::Error::new(ErrorKind::NotFound, "not found");
        assert!(!is_permission_denied(&not_found_err));
    }

    #[test]
    fn test_is_not_found() {
        let not_found_err = io::Error::new(ErrorKind::NotFound, "not found");
        assert!(is_not_found(&not_found_err));

        let perm_err = io::Error::new(ErrorKind::PermissionDenied, "access denied");
        assert!(!is_not_found(&perm_err));
    }

    #[test]
    fn test_permission_error_formatting() {
        let path = Path::new("/tmp/README.md");
        let msg = permission_error(path, "writing");
        assert!(msg.contains("Permission denied"));
        assert!(msg.contains("writing"));
        assert!(msg.contains("/tmp/README.md"));
        assert!(msg.contains("Possible fixes"));
    }

    #[test]
    fn test_hint_for_decode_error() {
        let source = String::from_utf8(vec![b'o', b'k', 0xff]).unwrap_err();
        let err = Error::Decode {
            path: PathBuf::from("/docs/README.md"),
            source,
        };

        let hint = hint_for(&err, "reading").unwrap();
        assert!(hint.contains("not valid UTF-8"));
        assert!(hint.contains("offset 2"));
    }

    #[test]
    fn test_hint_for_not_found() {
        let err = Error::Io {
            path: PathBuf::from("/docs/missing.md"),
            source: io::Error::new(ErrorKind::NotFound, "not found"),
        };

        let hint = hint_for(&err, "reading").unwrap();
        assert!(hint.contains("File not found"));
        assert!(hint.contains("/docs/missing.md"));
    }

    #[test]
    fn test_no_hint_for_pattern_error() {
        let err = Error::InvalidPattern("anchor must not be empty".into());
        assert!(hint_for(&err, "matching").is_none());

        let wrapped = explain(err, "matching");
        assert!(wrapped.to_string().contains("anchor must not be empty"));
    }
}
