use crate::error::{Error, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::multipart::{Form, Part};

const FILE_FIELD: &str = "file";
const FILE_NAME: &str = "ibans.csv";
const FILE_MIME: &str = "text/csv";

/// CSV payload of a group IBAN inquiry, either raw or base64 encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InquiryFile {
    Bytes(Vec<u8>),
    Base64(String),
}

impl InquiryFile {
    /// Build the CSV from a list of IBANs, one per row and no header
    pub fn from_ibans<I, S>(ibans: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        let mut rows = 0;
        for iban in ibans {
            writer
                .write_record([iban.as_ref().trim()])
                .map_err(|e| Error::Other(e.into()))?;
            rows += 1;
        }

        if rows == 0 {
            return Err(Error::InvalidArgument(
                "group inquiry needs at least one IBAN".to_string(),
            ));
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Other(anyhow::anyhow!("Failed to finish CSV: {}", e.error())))?;
        Ok(Self::Bytes(bytes))
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            InquiryFile::Bytes(bytes) => Ok(bytes),
            InquiryFile::Base64(encoded) => STANDARD
                .decode(encoded.trim())
                .map_err(|e| Error::InvalidArgument(format!("file is not valid base64: {}", e))),
        }
    }
}

pub(super) fn submit_form(file: InquiryFile) -> Result<Form> {
    let part = Part::bytes(file.into_bytes()?)
        .file_name(FILE_NAME)
        .mime_str(FILE_MIME)?;

    Ok(Form::new().part(FILE_FIELD, part))
}

pub(super) fn retry_form(inquiry_track_id: &str) -> Form {
    Form::new()
        .text("retry", "true")
        .text("inquiryTrackId", inquiry_track_id.to_string())
}
