pub const DELTA_MAGNITUDE_MAX: i64 = 100;

pub const DEFAULT_EVENT_PAGE: i64 = 200;
pub const MAX_EVENT_PAGE: i64 = 1000;

pub const DISPLAY_NAME_MAX_CHARS: usize = 40;
pub const FALLBACK_DISPLAY_NAME: &str = "someone";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// identity gateway headers
pub const HMAC_PREFIX: &str = "sha256=";
pub const IDENTITY_ID_HEADER: &str = "x-identity-id";
pub const IDENTITY_EMAIL_HEADER: &str = "x-identity-email";
pub const IDENTITY_TIMESTAMP_HEADER: &str = "x-identity-timestamp";
pub const IDENTITY_SIGNATURE_HEADER: &str = "x-identity-signature";
