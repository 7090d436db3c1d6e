// The XML envelope the portal's PublishWithValues endpoint expects.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::ValueEnum;
use quick_xml::events::BytesText;
use quick_xml::Writer;
use std::fmt;
use std::io;
use thiserror::Error;

/// Root element of the envelope.
pub const ROOT_ELEMENT: &str = "PublicationPublish.PublishWithValuesContract";
/// Default namespace of every envelope element.
pub const NAMESPACE: &str = "http://schemas.datacontract.org/2004/07/ChemicalSemantics.Services.WCF";
/// Category code for computational chemistry records.
pub const DEFAULT_CATEGORY: u32 = 14;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("failed to write envelope: {0}")]
    Write(#[from] io::Error),
    #[error("envelope is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Review status of a published record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Status {
    Preliminary,
    Draft,
    Final,
}

impl Status {
    pub fn code(self) -> u32 {
        match self {
            Status::Preliminary => 13,
            Status::Draft => 12,
            Status::Final => 11,
        }
    }
}

/// Who may see a published record. Sent in the envelope's `type` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

impl Visibility {
    pub fn code(self) -> u32 {
        match self {
            Visibility::Public => 8,
            Visibility::Private => 9,
            Visibility::Protected => 10,
        }
    }
}

/// The numeric codes attached to every upload in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeCodes {
    pub category: u32,
    pub status: Status,
    pub visibility: Visibility,
}

impl Default for EnvelopeCodes {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY,
            status: Status::Preliminary,
            visibility: Visibility::Public,
        }
    }
}

/// Everything that goes into one envelope. The payload is the raw file
/// contents; it is base64-encoded when the document is written.
pub struct Envelope<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub friendly_title: &'a str,
    pub codes: EnvelopeCodes,
    pub filename: &'a str,
    pub payload: &'a [u8],
}

// The password never shows up in debug output or logs.
impl fmt::Debug for Envelope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("friendly_title", &self.friendly_title)
            .field("codes", &self.codes)
            .field("filename", &self.filename)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl Envelope<'_> {
    /// Serialize the envelope to an XML document.
    pub fn to_xml(&self) -> Result<String, EnvelopeError> {
        let encoded = STANDARD.encode(self.payload);
        let category = self.codes.category.to_string();
        let status = self.codes.status.code().to_string();
        let visibility = self.codes.visibility.code().to_string();

        let fields: [(&str, &str); 8] = [
            ("username", self.username),
            ("userPassword", self.password),
            ("friendlyTitle", self.friendly_title),
            ("category", &category),
            ("status", &status),
            ("type", &visibility),
            ("filename", self.filename),
            ("fileBuffer", &encoded),
        ];

        let mut writer = Writer::new(Vec::new());
        writer
            .create_element(ROOT_ELEMENT)
            .with_attribute(("xmlns", NAMESPACE))
            .write_inner_content(|w| {
                for (name, value) in fields {
                    w.create_element(name)
                        .write_text_content(BytesText::new(value))?;
                }
                Ok(())
            })?;

        Ok(String::from_utf8(writer.into_inner())?)
    }
}
