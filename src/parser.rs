//! Parser for the newswire feed dialect.
//!
//! The feed is a loose XML-like stream: documents are bracketed by
//! `<DOC>`/`</DOC>`, and each field is an element whose content sits on the
//! same line or spans the following lines. Tags never nest and are never
//! split across lines, so a line-oriented scan is enough.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;

use crate::base::{IndexError, Result};
use crate::store::StoredDocument;

#[derive(Default)]
struct DocumentBuilder {
    docno: String,
    headline: String,
    date: String,
    source: String,
    body: String,
}

impl DocumentBuilder {
    fn set_field(&mut self, element: &str, content: &str) {
        let content = content.trim();
        match element {
            "DOCNO" => self.docno = content.to_owned(),
            "HL" => self.headline = content.to_owned(),
            "DATE" => self.date = content.to_owned(),
            "SO" => self.source = content.to_owned(),
            "LP" | "TEXT" | "P" => {
                if !self.body.is_empty() {
                    self.body.push(' ');
                }
                self.body.push_str(content);
            }
            // DOCID, IN, CO and the rest of the tag zoo carry nothing we keep
            _ => {}
        }
    }

    fn build(self) -> StoredDocument {
        StoredDocument {
            doc_id: format_docno(&self.docno),
            body: self.body,
            headline: self.headline,
            date: self.date,
            source: self.source,
        }
    }
}

pub fn parse_file(path: &Path) -> Result<Vec<StoredDocument>> {
    let file = File::open(path)?;
    parse_stream(BufReader::new(file))
}

/// Parses a feed stream into documents, in input order.
pub fn parse_stream(reader: impl BufRead) -> Result<Vec<StoredDocument>> {
    let mut documents = Vec::new();
    let mut current: Option<DocumentBuilder> = None;
    let mut element: Option<String> = None;
    let mut buffer = String::new();
    let mut line_number = 0usize;

    for line in reader.lines() {
        let line = line?;
        line_number += 1;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if line.contains("<DOC>") {
            if current.is_some() {
                warn!("line {}: <DOC> inside an open document", line_number);
            }
            current = Some(DocumentBuilder::default());
            element = None;
            buffer.clear();
            continue;
        }

        if line.contains("</DOC>") {
            match current.take() {
                Some(builder) => {
                    if builder.docno.is_empty() {
                        warn!("line {}: document without DOCNO, skipping", line_number);
                    } else {
                        documents.push(builder.build());
                    }
                }
                None => warn!("line {}: </DOC> without matching <DOC>", line_number),
            }
            element = None;
            buffer.clear();
            continue;
        }

        let Some(builder) = current.as_mut() else {
            continue;
        };

        if let Some(rest) = line.strip_prefix("</") {
            // closing tag: flush whatever the open element accumulated
            if rest.contains('>') {
                if let Some(name) = element.take() {
                    builder.set_field(&name, &buffer);
                }
                buffer.clear();
                continue;
            }
        }

        if let Some(rest) = line.strip_prefix('<') {
            if let Some(gt) = rest.find('>') {
                let name = rest[..gt].to_owned();
                let after = &rest[gt + 1..];
                // single-line element: <DOCNO> WSJ870108-0012 </DOCNO>
                if let Some(lt) = after.find('<') {
                    builder.set_field(&name, &after[..lt]);
                    element = None;
                } else {
                    element = Some(name);
                    buffer.clear();
                    if !after.trim().is_empty() {
                        buffer.push_str(after.trim());
                        buffer.push(' ');
                    }
                }
                continue;
            }
        }

        if element.is_some() {
            buffer.push_str(line);
            buffer.push(' ');
        }
    }

    if current.is_some() {
        return Err(IndexError::MalformedInput(format!(
            "unterminated document at end of input (line {})",
            line_number
        )));
    }

    Ok(documents)
}

/// Normalizes a raw document number to the `WSJyymmdd-nnnn` shape, zero
/// padding the sequence part. Anything unexpected passes through unchanged.
fn format_docno(docno: &str) -> String {
    let clean: String = docno.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if clean.len() >= 10 && clean.starts_with("WSJ") {
        let date = &clean[3..9];
        let sequence = &clean[9..];
        format!("WSJ{}-{:0>4}", date, sequence)
    } else {
        docno.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FEED: &str = "\
<DOC>
<DOCNO> WSJ870108-0012 </DOCNO>
<HL> Growth Outlook </HL>
<DATE> 870108 </DATE>
<SO> WALL STREET JOURNAL (J) </SO>
<LP>
Economic policy affects growth.
</LP>
<TEXT>
Daminozide is a plant growth
regulator.
</TEXT>
</DOC>
<DOC>
<DOCNO> WSJ8701080002 </DOCNO>
<TEXT> Policy, policy, policy! </TEXT>
</DOC>
";

    #[test]
    fn test_parse_feed() {
        let documents = parse_stream(Cursor::new(FEED)).unwrap();
        assert_eq!(documents.len(), 2);

        let first = &documents[0];
        assert_eq!(first.doc_id, "WSJ870108-0012");
        assert_eq!(first.headline, "Growth Outlook");
        assert_eq!(first.date, "870108");
        assert_eq!(first.source, "WALL STREET JOURNAL (J)");
        assert_eq!(
            first.body,
            "Economic policy affects growth. Daminozide is a plant growth regulator."
        );

        // docno without the hyphen gets reformatted and zero padded
        assert_eq!(documents[1].doc_id, "WSJ870108-0002");
        assert_eq!(documents[1].body, "Policy, policy, policy!");
    }

    #[test]
    fn test_unterminated_document() {
        let err = parse_stream(Cursor::new("<DOC>\n<DOCNO> WSJ870108-0001 </DOCNO>\n")).unwrap_err();
        assert!(matches!(err, IndexError::MalformedInput(_)));
    }

    #[test]
    fn test_stray_close_is_tolerated() {
        let documents = parse_stream(Cursor::new("</DOC>\n")).unwrap();
        assert!(documents.is_empty());
    }
}
