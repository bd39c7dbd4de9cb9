//! Starter documents for `nld init`.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::document::{Content, Document, Entity, Metadata, Section, DOCUMENT_VERSION};

/// Caller-supplied values; anything left `None` gets a default.
#[derive(Debug, Clone, Default)]
pub struct TemplateFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub jurisdiction: Option<String>,
    /// Creation time, now when unset
    pub created: Option<DateTime<Utc>>,
}

/// Build a new document of `kind`. The kind is lower-cased; unknown kinds
/// get a single generic section.
pub fn new_document(kind: &str, fields: &TemplateFields) -> Document {
    let kind = kind.to_lowercase();
    let created = fields
        .created
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut metadata = Metadata {
        version: DOCUMENT_VERSION.to_string(),
        doc_type: kind.clone(),
        created,
        title: fields
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("New {}", kind)),
        author: fields.author.clone().filter(|a| !a.is_empty()),
        entities: Vec::new(),
        jurisdiction: fields.jurisdiction.clone().filter(|j| !j.is_empty()),
    };

    if kind == "nda" {
        metadata.entities = vec![
            party("party1", "Disclosing Party", "disclosing"),
            party("party2", "Receiving Party", "receiving"),
        ];
        metadata
            .jurisdiction
            .get_or_insert_with(|| "Unspecified".to_string());
    }

    Document {
        metadata,
        content: Content {
            sections: sections_for(&kind),
            ..Content::default()
        },
        relationships: Default::default(),
        verification: Default::default(),
    }
}

/// Whether `kind` takes a jurisdiction prompt in interactive mode.
pub fn wants_jurisdiction(kind: &str) -> bool {
    matches!(kind.to_lowercase().as_str(), "contract" | "agreement" | "nda")
}

fn party(id: &str, name: &str, role: &str) -> Entity {
    Entity {
        id: id.to_string(),
        name: name.to_string(),
        role: Some(role.to_string()),
    }
}

fn sections_for(kind: &str) -> Vec<Section> {
    let specs: &[(&str, &str, &str)] = match kind {
        "contract" => &[
            ("parties", "Parties", "This agreement is between the following parties:"),
            ("scope", "Scope of Work", "The scope of work includes the following:"),
            ("terms", "Terms and Conditions", "The following terms and conditions apply:"),
        ],
        "receipt" => &[
            ("transaction", "Transaction Details", "Transaction details go here."),
            ("items", "Items", "List of items purchased."),
            ("payment", "Payment Information", "Payment details go here."),
        ],
        "agreement" => &[
            (
                "introduction",
                "Introduction",
                "This agreement is made on the date specified above.",
            ),
            ("terms", "Terms of Agreement", "The parties agree to the following terms:"),
            (
                "signatures",
                "Signatures",
                "The parties have executed this agreement as follows:",
            ),
        ],
        "nda" => &[
            (
                "definitions",
                "Confidential Information",
                "Confidential information means the following:",
            ),
            (
                "obligations",
                "Obligations",
                "The receiving party agrees to the following obligations:",
            ),
            (
                "term",
                "Term",
                "These obligations remain in effect for the following period:",
            ),
        ],
        _ => &[("section1", "Section 1", "Enter your content here.")],
    };

    specs
        .iter()
        .map(|(id, title, content)| Section {
            content: content.to_string(),
            ..Section::new(id, title)
        })
        .collect()
}
