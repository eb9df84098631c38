use crate::models::enums::DocumentType;

/// Keyword phrases per category, matched as lowercase substrings.
/// Table order is scoring order and breaks ties.
pub const DOCUMENT_KEYWORDS: [(DocumentType, &[&str]); 5] = [
    (
        DocumentType::Deed,
        &[
            "grantor",
            "grantee",
            "warranty deed",
            "quit claim",
            "executed by",
            "fee simple",
            "conveys",
            "property address",
        ],
    ),
    (
        DocumentType::Mortgage,
        &[
            "mortgage",
            "borrower",
            "lender",
            "loan amount",
            "security deed",
            "deed of trust",
        ],
    ),
    (
        DocumentType::Lien,
        &[
            "lien",
            "recorded lien",
            "debtor",
            "creditor",
            "mechanic's lien",
            "lis pendens",
        ],
    ),
    (
        DocumentType::Judgment,
        &[
            "judgment",
            "plaintiff",
            "defendant",
            "court",
            "awarded",
            "final judgment",
        ],
    ),
    (
        DocumentType::Release,
        &[
            "satisfaction",
            "release of mortgage",
            "discharge",
            "cancelled",
            "paid in full",
        ],
    ),
];

/// One exemplar passage per category for the embedding fallback.
pub const REFERENCE_TEXTS: [(DocumentType, &str); 5] = [
    (
        DocumentType::Deed,
        "This Warranty Deed is made by the grantor to the grantee for the consideration of...",
    ),
    (
        DocumentType::Mortgage,
        "This Mortgage is made between the borrower and the lender to secure a loan amount...",
    ),
    (
        DocumentType::Lien,
        "A lien is hereby recorded against the property of the debtor in favor of the creditor...",
    ),
    (
        DocumentType::Judgment,
        "Final judgment is entered in favor of the plaintiff and against the defendant...",
    ),
    (
        DocumentType::Release,
        "This document is a Satisfaction of Mortgage, fully releasing the borrower...",
    ),
];
