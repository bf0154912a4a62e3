use std::io::{self, Write};

/// Print a failure to stderr in the `error: <message>` form scripts match on
pub fn display_error(message: &str) {
    eprintln!("error: {}", message);
}

/// Print one version per line
pub fn display_versions<W: Write>(out: &mut W, versions: &[String]) -> io::Result<()> {
    for version in versions {
        writeln!(out, "{}", version)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_versions() {
        let mut out = Vec::new();
        display_versions(&mut out, &["v1.0.0".to_string(), "bar/v0.2.0".to_string()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "v1.0.0\nbar/v0.2.0\n");
    }
}
