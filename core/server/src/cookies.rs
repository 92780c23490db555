//! Refresh-credential cookie contract.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie carrying the refresh credential between the user agent and the
/// relay. Never readable from script.
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Refresh-credential lifetime: 30 days.
const REFRESH_COOKIE_DAYS: i64 = 30;

/// Build the refresh-credential cookie.
///
/// In production the cookie must survive a cross-site fetch from the
/// browser origin, hence `Secure` + `SameSite=None`; in development the
/// relay and the origin share a site, so `Lax` keeps the cookie off
/// third-party requests.
pub fn refresh_cookie(value: &str, production: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, value.to_string()))
        .http_only(true)
        .secure(production)
        .same_site(if production {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .path("/")
        .max_age(Duration::days(REFRESH_COOKIE_DAYS))
        .build()
}

/// Create a removal cookie for the refresh credential.
pub fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_cookie_flags() {
        let cookie = refresh_cookie("rt-1", false);
        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.value(), "rt-1");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(30)));
    }

    #[test]
    fn test_production_cookie_flags() {
        let cookie = refresh_cookie("rt-1", true);
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_refresh_cookie();
        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }
}
