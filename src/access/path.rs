use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is not absolute")]
    NotAbsolute,
    #[error("path is not valid percent-encoded UTF-8")]
    InvalidEncoding,
    #[error("path escapes the site root")]
    ParentSegment,
}

/// canonical_path
///
/// Reduces a request path to the form the static file service resolves:
/// percent-decoded, with empty and `.` segments dropped. `..` segments are
/// refused outright. A trailing slash survives so directory-style URLs keep
/// their shape.
pub fn canonical_path(raw: &str) -> Result<String, PathError> {
    if !raw.starts_with('/') {
        return Err(PathError::NotAbsolute);
    }

    let decoded = urlencoding::decode(raw).map_err(|_| PathError::InvalidEncoding)?;

    let mut canonical = String::with_capacity(decoded.len());
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(PathError::ParentSegment),
            segment => {
                canonical.push('/');
                canonical.push_str(segment);
            }
        }
    }

    if canonical.is_empty() {
        return Ok("/".to_string());
    }
    if decoded.ends_with('/') {
        canonical.push('/');
    }
    Ok(canonical)
}
