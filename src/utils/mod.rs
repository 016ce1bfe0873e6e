//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::Result;

/// Resolve a potentially relative URL against the page it was found on.
pub fn resolve_url(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base)?;
    Ok(base.join(href)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = "https://irr.ru/real-estate/rent/";
        assert_eq!(
            resolve_url(base, "page2/").unwrap(),
            "https://irr.ru/real-estate/rent/page2/"
        );
        assert_eq!(
            resolve_url(base, "/real-estate/rent/page3/").unwrap(),
            "https://irr.ru/real-estate/rent/page3/"
        );
        assert_eq!(
            resolve_url(base, "https://other.irr.ru/x").unwrap(),
            "https://other.irr.ru/x"
        );
    }

    #[test]
    fn test_resolve_url_bad_base() {
        assert!(resolve_url("not a url", "/x").is_err());
    }
}
