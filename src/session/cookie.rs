use actix_web::cookie::{time::Duration, Cookie, SameSite};

use super::token::{SessionToken, TokenError};

/// Name of the cookie carrying the signed session token
pub const COOKIE_NAME: &str = "__session_validated";

/// Session cookie lifetime when none (or an unusable one) is configured
pub const DEFAULT_COOKIE_MAX_AGE_HOURS: u64 = 24;

/// Longest session cookie lifetime browsers honor (400 days)
pub const MAX_COOKIE_MAX_AGE_HOURS: u64 = 400 * 24;

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: Duration::hours(24),
        }
    }
}

/// Builds session cookies with the configured attributes
#[derive(Debug, Clone)]
pub struct CookieFactory {
    cookie_secure: bool,
    max_age_hours: u64,
}

impl CookieFactory {
    #[must_use]
    pub fn new(cookie_secure: bool, max_age_hours: u64) -> Self {
        Self {
            cookie_secure,
            max_age_hours,
        }
    }

    /// Build a cookie from a raw value
    #[must_use]
    pub fn create_cookie(&self, name: &str, value: String, options: CookieOptions) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish()
    }

    /// Configured lifetime, or the 24h default when it is zero or longer than
    /// [`MAX_COOKIE_MAX_AGE_HOURS`]
    #[must_use]
    pub fn max_age(&self) -> Duration {
        let hours = match self.max_age_hours {
            1..=MAX_COOKIE_MAX_AGE_HOURS => self.max_age_hours,
            _ => DEFAULT_COOKIE_MAX_AGE_HOURS,
        };
        // Bounded above, so the conversion cannot fail
        Duration::hours(i64::try_from(hours).unwrap_or(24))
    }

    /// Encode `token` into the session cookie
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be serialized
    pub fn create_session_cookie(&self, token: &SessionToken) -> Result<Cookie<'static>, TokenError> {
        Ok(self.create_cookie(
            COOKIE_NAME,
            token.encode()?,
            CookieOptions {
                max_age: self.max_age(),
                ..Default::default()
            },
        ))
    }
}

/// Whether a raw `Cookie` header mentions the session cookie at all.
///
/// This is a plain substring check on `name=`; it does not parse the header.
#[must_use]
pub fn has_session_cookie(cookie_header: Option<&str>) -> bool {
    cookie_header.is_some_and(|header| header.contains(&format!("{COOKIE_NAME}=")))
}

/// Pull the session cookie value out of a raw `Cookie` header
#[must_use]
pub fn session_cookie_value(cookie_header: Option<&str>) -> Option<&str> {
    cookie_header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// Remove the session cookie from a raw `Cookie` header before it is sent
/// upstream. Returns `None` when nothing else is left.
#[must_use]
pub fn strip_session_cookie(cookie_header: &str) -> Option<String> {
    let kept: Vec<&str> = cookie_header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            pair.split_once('=')
                .map_or(true, |(name, _)| name.trim() != COOKIE_NAME)
        })
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::constants::TEST_SESSION_SECRET;

    #[test]
    fn test_session_cookie_attributes() {
        let factory = CookieFactory::new(true, 24);
        let token = SessionToken::mint(TEST_SESSION_SECRET, 1_700_000_000_000);
        let cookie = factory.create_session_cookie(&token).unwrap();

        assert_eq!(cookie.name(), COOKIE_NAME);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::hours(24)));
        assert_eq!(SessionToken::decode(cookie.value()).unwrap(), token);
    }

    #[test]
    fn test_unusable_max_age_falls_back_to_default() {
        let token = SessionToken::mint(TEST_SESSION_SECRET, 1);

        for hours in [0, MAX_COOKIE_MAX_AGE_HOURS + 1, 9_000_000_000_000_000, u64::MAX] {
            let cookie = CookieFactory::new(true, hours)
                .create_session_cookie(&token)
                .unwrap();
            assert_eq!(cookie.max_age(), Some(Duration::hours(24)), "{hours}h");
        }

        let cookie = CookieFactory::new(true, MAX_COOKIE_MAX_AGE_HOURS)
            .create_session_cookie(&token)
            .unwrap();
        assert_eq!(cookie.max_age(), Some(Duration::days(400)));
    }

    #[test]
    fn test_insecure_cookies_outside_production() {
        let factory = CookieFactory::new(false, 24);
        let token = SessionToken::mint(TEST_SESSION_SECRET, 1);
        let cookie = factory.create_session_cookie(&token).unwrap();
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn test_has_session_cookie_is_presence_only() {
        assert!(has_session_cookie(Some("__session_validated=anything")));
        assert!(has_session_cookie(Some("a=1; __session_validated=x; b=2")));
        assert!(!has_session_cookie(Some("__session_validated")));
        assert!(!has_session_cookie(Some("theme=dark")));
        assert!(!has_session_cookie(None));
    }

    #[test]
    fn test_session_cookie_value() {
        assert_eq!(
            session_cookie_value(Some("a=1; __session_validated=abc==; b=2")),
            Some("abc==")
        );
        assert_eq!(session_cookie_value(Some("x__session_validated=abc")), None);
        assert_eq!(session_cookie_value(Some("garbage")), None);
        assert_eq!(session_cookie_value(None), None);
    }

    #[test]
    fn test_strip_session_cookie() {
        assert_eq!(
            strip_session_cookie("__session_validated=abc; theme=dark; lang=en"),
            Some("theme=dark; lang=en".to_string())
        );
        assert_eq!(strip_session_cookie("__session_validated=abc"), None);
        assert_eq!(
            strip_session_cookie("theme=dark"),
            Some("theme=dark".to_string())
        );
    }
}
