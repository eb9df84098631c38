use crate::models::enums::DocumentType;

/// A named field and the natural-language prompts that describe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySlot {
    pub name: &'static str,
    pub prompts: &'static [&'static str],
}

pub const DEED_SLOTS: &[EntitySlot] = &[
    EntitySlot {
        name: "grantor",
        prompts: &[
            "Who is the grantor?",
            "Who is the seller?",
            "Who is transferring the property?",
        ],
    },
    EntitySlot {
        name: "grantee",
        prompts: &[
            "Who is the grantee?",
            "Who is the buyer?",
            "Who is receiving the property?",
        ],
    },
    EntitySlot {
        name: "recording_date",
        prompts: &["When was this document recorded?", "Recording date"],
    },
    EntitySlot {
        name: "dated_date",
        prompts: &[
            "When was this document signed?",
            "Execution date",
            "Dated this day",
        ],
    },
    EntitySlot {
        name: "consideration_amount",
        prompts: &[
            "What is the consideration amount?",
            "What amount was paid?",
            "Monetary value exchanged",
        ],
    },
];

/// Slots defined for a document type, in output order.
/// Only deeds carry a schema today.
pub fn entity_schema(doc_type: DocumentType) -> Option<&'static [EntitySlot]> {
    match doc_type {
        DocumentType::Deed => Some(DEED_SLOTS),
        _ => None,
    }
}
