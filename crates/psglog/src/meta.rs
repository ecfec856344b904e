//! GD3 tag (track metadata) attached to VGM files.
//!
//! A GD3 chunk is `"Gd3 "`, a u32 version, a u32 byte length, then eleven
//! UTF-16LE nul-terminated strings. The tag has no effect on playback; it is
//! loaded for display only.
use crate::binutil::{read_slice, read_u32_le_at};
use crate::error::{Error, FormatError};

const GD3_IDENT: &[u8; 4] = b"Gd3 ";
const GD3_FIELDS: usize = 11;

#[derive(Debug, Clone, PartialEq)]
pub struct Gd3 {
    pub track_name_en: Option<String>,
    pub track_name_jp: Option<String>,
    pub game_name_en: Option<String>,
    pub game_name_jp: Option<String>,
    pub system_name_en: Option<String>,
    pub system_name_jp: Option<String>,
    pub author_name_en: Option<String>,
    pub author_name_jp: Option<String>,
    pub release_date: Option<String>,
    pub creator: Option<String>,
    pub notes: Option<String>,
    /// Raw chunk version, `0x00000100` for 1.00.
    pub version: u32,
}

impl Default for Gd3 {
    fn default() -> Self {
        Gd3 {
            track_name_en: None,
            track_name_jp: None,
            game_name_en: None,
            game_name_jp: None,
            system_name_en: None,
            system_name_jp: None,
            author_name_en: None,
            author_name_jp: None,
            release_date: None,
            creator: None,
            notes: None,
            version: 0x00000100,
        }
    }
}

impl Gd3 {
    fn fields(&self) -> [&Option<String>; GD3_FIELDS] {
        [
            &self.track_name_en,
            &self.track_name_jp,
            &self.game_name_en,
            &self.game_name_jp,
            &self.system_name_en,
            &self.system_name_jp,
            &self.author_name_en,
            &self.author_name_jp,
            &self.release_date,
            &self.creator,
            &self.notes,
        ]
    }

    /// Best display title: English track name, falling back to Japanese.
    pub fn title(&self) -> Option<&str> {
        self.track_name_en
            .as_deref()
            .or(self.track_name_jp.as_deref())
    }

    /// Serialize into a complete GD3 chunk.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data: Vec<u8> = Vec::new();
        for field in self.fields() {
            if let Some(s) = field {
                for code in s.encode_utf16() {
                    data.extend_from_slice(&code.to_le_bytes());
                }
            }
            data.extend_from_slice(&0_u16.to_le_bytes());
        }

        let mut out = Vec::with_capacity(12 + data.len());
        out.extend_from_slice(GD3_IDENT);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&data);
        out
    }
}

/// Parse a GD3 chunk starting at offset 0 of `bytes`.
///
/// Strings cut short by the declared length are treated as absent, and
/// unpaired surrogates are replaced rather than rejected.
pub(crate) fn parse_gd3(bytes: &[u8]) -> Result<Gd3, Error> {
    let ident = read_slice(bytes, 0, 4)?;
    if ident != GD3_IDENT {
        let mut id = [0u8; 4];
        id.copy_from_slice(ident);
        return Err(FormatError::InvalidIdent(id).into());
    }
    let version = read_u32_le_at(bytes, 4)?;
    let len = read_u32_le_at(bytes, 8)? as usize;
    let data = read_slice(bytes, 12, len)?;

    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    let mut fields: Vec<Option<String>> = Vec::with_capacity(GD3_FIELDS);
    let mut rest = units.as_slice();
    for _ in 0..GD3_FIELDS {
        match rest.iter().position(|&u| u == 0) {
            Some(end) => {
                let s = &rest[..end];
                fields.push((!s.is_empty()).then(|| String::from_utf16_lossy(s)));
                rest = &rest[end + 1..];
            }
            None => break,
        }
    }
    fields.resize(GD3_FIELDS, None);

    let mut it = fields.into_iter();
    let mut next = || it.next().flatten();
    Ok(Gd3 {
        track_name_en: next(),
        track_name_jp: next(),
        game_name_en: next(),
        game_name_jp: next(),
        system_name_en: next(),
        system_name_jp: next(),
        author_name_en: next(),
        author_name_jp: next(),
        release_date: next(),
        creator: next(),
        notes: next(),
        version,
    })
}

impl std::convert::TryFrom<&[u8]> for Gd3 {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_gd3(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serialized_tag() {
        let gd3 = Gd3 {
            track_name_en: Some("Green Hill".into()),
            game_name_jp: Some("ソニック".into()),
            notes: Some("loop".into()),
            ..Default::default()
        };
        let parsed = parse_gd3(&gd3.to_bytes()).unwrap();
        assert_eq!(parsed, gd3);
        assert_eq!(parsed.title(), Some("Green Hill"));
    }

    #[test]
    fn missing_trailing_fields_are_none() {
        // Only the first field, "A", is present.
        let mut bytes = b"Gd3 ".to_vec();
        bytes.extend_from_slice(&0x100u32.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[b'A', 0, 0, 0]);
        let gd3 = parse_gd3(&bytes).unwrap();
        assert_eq!(gd3.track_name_en.as_deref(), Some("A"));
        assert_eq!(gd3.notes, None);
    }

    #[test]
    fn rejects_bad_ident() {
        assert!(matches!(
            parse_gd3(b"Gd4 \0\x01\0\0\0\0\0\0"),
            Err(Error::Format(FormatError::InvalidIdent(_)))
        ));
    }
}
