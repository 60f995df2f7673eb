use crate::{Result, constants::DEVICE_SEPARATOR, error::Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// One scanned identity.
///
/// A token is identified by its `uid` and `text`. The scan time, the reader
/// it came from and the `remote` flag are metadata and do not take part in
/// equality, so two scans of the same tag compare equal.
///
/// # Examples
///
/// ```
/// use taplink_core::Token;
///
/// let first = Token::new("04A1B2C3", "").unwrap();
/// let again = Token::builder().uid("04A1B2C3").source("mock:a").build().unwrap();
/// assert_eq!(first, again);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Hardware identifier of the tag, if the reader exposes one.
    pub uid: String,

    /// Text payload stored on the tag.
    pub text: String,

    /// When the token was scanned.
    pub scanned_at: DateTime<Utc>,

    /// True when the token did not come from a locally present reader.
    pub remote: bool,

    /// Id of the reader that produced the token.
    pub source: String,
}

impl Token {
    /// Create a local token scanned now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if both `uid` and `text` are empty.
    pub fn new(uid: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        Self::builder().uid(uid).text(text).build()
    }

    /// Create a builder for tokens with metadata.
    pub fn builder() -> TokenBuilder {
        TokenBuilder::default()
    }

    /// Return a copy of this token attributed to another reader.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Compare identities of two optional tokens. Two absent tokens are equal.
    pub fn same(a: Option<&Token>, b: Option<&Token>) -> bool {
        a == b
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid && self.text == other.text
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
        self.text.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.uid.is_empty(), self.text.is_empty()) {
            (false, false) => write!(f, "{} ({})", self.text, self.uid),
            (true, _) => write!(f, "{}", self.text),
            (false, true) => write!(f, "{}", self.uid),
        }?;
        if self.remote {
            write!(f, " [remote]")?;
        }
        Ok(())
    }
}

/// Builder for [`Token`].
#[derive(Debug, Default)]
pub struct TokenBuilder {
    uid: String,
    text: String,
    remote: bool,
    source: String,
}

impl TokenBuilder {
    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Build the token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] if both `uid` and `text` are empty.
    pub fn build(self) -> Result<Token> {
        if self.uid.is_empty() && self.text.is_empty() {
            return Err(Error::InvalidToken(
                "token needs a uid or a text payload".to_string(),
            ));
        }

        Ok(Token {
            uid: self.uid,
            text: self.text,
            scanned_at: Utc::now(),
            remote: self.remote,
            source: self.source,
        })
    }
}

/// What a reader observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanKind {
    /// A token entered the reader field.
    Inserted(Token),

    /// The token left the reader field.
    Removed,

    /// The reader failed to read a token.
    Failed(String),
}

/// One event pushed by a reader onto the scan queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    /// Id (`driver:path`) of the reader that produced the scan.
    pub source: String,

    pub kind: ScanKind,
}

impl Scan {
    pub fn inserted(source: impl Into<String>, token: Token) -> Self {
        Self {
            source: source.into(),
            kind: ScanKind::Inserted(token),
        }
    }

    pub fn removed(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: ScanKind::Removed,
        }
    }

    pub fn failed(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: ScanKind::Failed(message.into()),
        }
    }

    /// The scanned token, if this scan is an insertion.
    pub fn token(&self) -> Option<&Token> {
        match &self.kind {
            ScanKind::Inserted(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ScanKind::Failed(_))
    }
}

/// Reader address in `driver:path` form.
///
/// The driver part selects the implementation, the path is opaque to
/// everything but that driver and may itself contain separators.
///
/// ```
/// use taplink_core::DeviceString;
///
/// let device: DeviceString = "file:/tmp/tag.txt".parse().unwrap();
/// assert_eq!(device.driver(), "file");
/// assert_eq!(device.path(), "/tmp/tag.txt");
/// assert_eq!(device.to_string(), "file:/tmp/tag.txt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceString {
    driver: String,
    path: String,
}

impl DeviceString {
    /// Parse a `driver:path` string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDeviceString`] if the separator is missing or
    /// the driver part is empty.
    pub fn parse(device: &str) -> Result<Self> {
        let (driver, path) = device
            .split_once(DEVICE_SEPARATOR)
            .ok_or_else(|| Error::invalid_device_string(device))?;

        if driver.trim().is_empty() {
            return Err(Error::invalid_device_string(device));
        }

        Ok(Self {
            driver: driver.to_string(),
            path: path.to_string(),
        })
    }

    pub fn new(driver: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            path: path.into(),
        }
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Registry id of a reader opened on this device.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DeviceString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}{}", self.driver, DEVICE_SEPARATOR, self.path)
    }
}

impl std::str::FromStr for DeviceString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceString::parse(s)
    }
}

impl TryFrom<String> for DeviceString {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DeviceString::parse(&value)
    }
}

impl From<DeviceString> for String {
    fn from(value: DeviceString) -> Self {
        value.to_string()
    }
}
