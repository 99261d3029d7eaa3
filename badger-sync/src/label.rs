//! Badge labels and their display styles
//!
//! Catalog documents store a badge as the storefront's display text (Arabic),
//! which is what the serving front end matches on. [`Label`] is the typed form;
//! [`Label::as_text`] and [`Label::from_text`] convert between the two.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Style used for badge text that is not one of the known labels
pub const FALLBACK_STYLE: &str = "bg-gray-500 text-white";

/// Merchandising badge assigned to a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    New,
    BestSeller,
    MostLiked,
    Featured,
    Trending,
    Popular,
    OnSale,
    OutOfStock,
    LowStock,
}

impl Label {
    pub const ALL: [Label; 9] = [
        Label::New,
        Label::BestSeller,
        Label::MostLiked,
        Label::Featured,
        Label::Trending,
        Label::Popular,
        Label::OnSale,
        Label::OutOfStock,
        Label::LowStock,
    ];

    /// Text stored in the catalog document
    pub fn as_text(self) -> &'static str {
        match self {
            Label::New => "جديد",
            Label::BestSeller => "أكثر مبيعاً",
            Label::MostLiked => "أكثر إعجاباً",
            Label::Featured => "مميزة",
            Label::Trending => "أكثر مشاهدة",
            Label::Popular => "أكثر طلباً",
            Label::OnSale => "تخفيضات",
            Label::OutOfStock => "غير متوفر",
            Label::LowStock => "متوفر",
        }
    }

    /// Parse stored badge text back into a label
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|label| label.as_text() == text)
    }

    /// Stable ASCII code, used in logs and exported reports
    pub fn code(self) -> &'static str {
        match self {
            Label::New => "NEW",
            Label::BestSeller => "BEST_SELLER",
            Label::MostLiked => "MOST_LIKED",
            Label::Featured => "FEATURED",
            Label::Trending => "TRENDING",
            Label::Popular => "POPULAR",
            Label::OnSale => "ON_SALE",
            Label::OutOfStock => "OUT_OF_STOCK",
            Label::LowStock => "LOW_STOCK",
        }
    }

    /// Display style written to `badgeColor`
    pub fn style(self) -> &'static str {
        color_for(self)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Static label → style table
pub fn color_for(label: Label) -> &'static str {
    match label {
        Label::New => "bg-teal-600 text-white",
        Label::BestSeller => "bg-red-500 text-white",
        Label::MostLiked => "bg-yellow-500 text-black",
        Label::Featured => "bg-yellow-800 text-white",
        Label::Trending => "bg-blue-900 text-white",
        Label::Popular => "bg-orange-500 text-white",
        Label::OnSale => "bg-pink-600 text-white",
        Label::OutOfStock => "bg-orange-700 text-white",
        Label::LowStock => "bg-green-500 text-white",
    }
}

/// Style for arbitrary stored badge text, falling back for unknown text
pub fn color_for_text(text: &str) -> &'static str {
    Label::from_text(text).map(color_for).unwrap_or(FALLBACK_STYLE)
}
