//! Badge classifier: one ordered rule table, several named profiles
//!
//! Rules are evaluated top to bottom and the first match wins. An item that
//! matches no rule is [`Label::New`]. All comparisons are strict except the
//! stock-out check (`quantity <= 0`).
//!
//! **Profiles:**
//! - `standard`: out of stock → on sale → featured → best seller → most liked
//!   → popular → trending → new. Items need an `orders` key to be classified.
//! - `stock-aware`: adds a low-stock tier ahead of the sale check, requires an
//!   actual price drop for the sale badge, classifies every item, and always
//!   writes `badgeColor`.

use crate::label::Label;
use crate::stats::{ItemStats, ORDERS};
use badger_common::config::RulesConfig;
use badger_common::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Version of the rule table, bumped whenever a rule or its order changes
pub const RULES_VERSION: &str = "badge-rules/1";

/// Numeric thresholds shared by every rule table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Discount percent the sale rule must exceed
    pub discount_percent: f64,
    /// Orders a best seller (and featured item) must exceed
    pub best_seller_orders: f64,
    /// Likes a most-liked (and featured) item must exceed
    pub most_liked_likes: f64,
    /// Orders a popular item must exceed
    pub popular_orders: f64,
    /// Views a trending item must exceed
    pub trending_views: f64,
    /// In-stock quantity below which an item is low stock
    pub low_stock_below: f64,
}

impl Thresholds {
    pub const fn standard() -> Self {
        Self {
            discount_percent: 10.0,
            best_seller_orders: 100.0,
            most_liked_likes: 200.0,
            popular_orders: 50.0,
            trending_views: 400.0,
            low_stock_below: 5.0,
        }
    }

    fn with_overrides(mut self, config: &RulesConfig) -> Self {
        if let Some(v) = config.discount_percent {
            self.discount_percent = v;
        }
        if let Some(v) = config.best_seller_orders {
            self.best_seller_orders = v as f64;
        }
        if let Some(v) = config.most_liked_likes {
            self.most_liked_likes = v as f64;
        }
        if let Some(v) = config.popular_orders {
            self.popular_orders = v as f64;
        }
        if let Some(v) = config.trending_views {
            self.trending_views = v as f64;
        }
        if let Some(v) = config.low_stock_threshold {
            self.low_stock_below = v as f64;
        }
        self
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::standard()
    }
}

type Predicate = fn(&ItemStats, &Thresholds) -> bool;

/// One `(predicate, label)` row of a rule table
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub label: Label,
    predicate: Predicate,
}

impl Rule {
    const fn new(name: &'static str, label: Label, predicate: Predicate) -> Self {
        Self { name, label, predicate }
    }

    pub fn matches(&self, stats: &ItemStats, thresholds: &Thresholds) -> bool {
        (self.predicate)(stats, thresholds)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish()
    }
}

fn out_of_stock(s: &ItemStats, _: &Thresholds) -> bool {
    s.quantity <= 0.0
}

fn low_stock(s: &ItemStats, t: &Thresholds) -> bool {
    s.quantity > 0.0 && s.quantity < t.low_stock_below
}

fn discounted(s: &ItemStats, t: &Thresholds) -> bool {
    s.discount_percent() > t.discount_percent
}

fn discounted_with_price_drop(s: &ItemStats, t: &Thresholds) -> bool {
    s.original_price > s.price && discounted(s, t)
}

fn featured(s: &ItemStats, t: &Thresholds) -> bool {
    s.orders > t.best_seller_orders && s.likes > t.most_liked_likes
}

fn best_seller(s: &ItemStats, t: &Thresholds) -> bool {
    s.orders > t.best_seller_orders
}

fn most_liked(s: &ItemStats, t: &Thresholds) -> bool {
    s.likes > t.most_liked_likes
}

fn popular(s: &ItemStats, t: &Thresholds) -> bool {
    s.orders > t.popular_orders
}

fn trending(s: &ItemStats, t: &Thresholds) -> bool {
    s.views > t.trending_views
}

const STANDARD_RULES: &[Rule] = &[
    Rule::new("out-of-stock", Label::OutOfStock, out_of_stock),
    Rule::new("discount", Label::OnSale, discounted),
    Rule::new("featured", Label::Featured, featured),
    Rule::new("best-seller", Label::BestSeller, best_seller),
    Rule::new("most-liked", Label::MostLiked, most_liked),
    Rule::new("popular", Label::Popular, popular),
    Rule::new("trending", Label::Trending, trending),
];

const STOCK_AWARE_RULES: &[Rule] = &[
    Rule::new("out-of-stock", Label::OutOfStock, out_of_stock),
    Rule::new("low-stock", Label::LowStock, low_stock),
    Rule::new("discount", Label::OnSale, discounted_with_price_drop),
    Rule::new("featured", Label::Featured, featured),
    Rule::new("best-seller", Label::BestSeller, best_seller),
    Rule::new("most-liked", Label::MostLiked, most_liked),
    Rule::new("popular", Label::Popular, popular),
    Rule::new("trending", Label::Trending, trending),
];

/// Label for items no rule matches
pub const FALLBACK_LABEL: Label = Label::New;

fn evaluate(rules: &[Rule], thresholds: &Thresholds, stats: &ItemStats) -> Label {
    rules
        .iter()
        .find(|rule| rule.matches(stats, thresholds))
        .map(|rule| rule.label)
        .unwrap_or(FALLBACK_LABEL)
}

/// Classify with the `standard` profile and default thresholds
pub fn classify(stats: &ItemStats) -> Label {
    evaluate(STANDARD_RULES, &Thresholds::standard(), stats)
}

/// Named rule profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Standard,
    StockAware,
}

impl Profile {
    pub fn name(self) -> &'static str {
        match self {
            Profile::Standard => "standard",
            Profile::StockAware => "stock-aware",
        }
    }

    pub fn rules(self) -> &'static [Rule] {
        match self {
            Profile::Standard => STANDARD_RULES,
            Profile::StockAware => STOCK_AWARE_RULES,
        }
    }

    fn default_eligibility(self) -> Vec<String> {
        match self {
            Profile::Standard => vec![ORDERS.to_string()],
            Profile::StockAware => Vec::new(),
        }
    }

    fn assigns_color_by_default(self) -> bool {
        matches!(self, Profile::StockAware)
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Profile::Standard),
            "stock-aware" | "stock_aware" => Ok(Profile::StockAware),
            other => Err(Error::InvalidInput(format!(
                "unknown rule profile '{}' (expected 'standard' or 'stock-aware')",
                other
            ))),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A profile with its thresholds, eligibility keys and color policy resolved
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    profile: Profile,
    thresholds: Thresholds,
    eligibility: Vec<String>,
    assign_color: bool,
}

impl RuleSet {
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            profile,
            thresholds: Thresholds::standard(),
            eligibility: profile.default_eligibility(),
            assign_color: profile.assigns_color_by_default(),
        }
    }

    pub fn standard() -> Self {
        Self::for_profile(Profile::Standard)
    }

    pub fn stock_aware() -> Self {
        Self::for_profile(Profile::StockAware)
    }

    /// Build from the `[rules]` config section
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        let profile: Profile = config.profile.parse()?;
        let mut rules = Self::for_profile(profile);
        rules.thresholds = rules.thresholds.with_overrides(config);
        if let Some(keys) = &config.eligibility {
            rules.eligibility = keys.clone();
        }
        if let Some(assign) = config.assign_color {
            rules.assign_color = assign;
        }
        Ok(rules)
    }

    pub fn with_eligibility<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.eligibility = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_color(mut self, assign_color: bool) -> Self {
        self.assign_color = assign_color;
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn assigns_color(&self) -> bool {
        self.assign_color
    }

    /// `<table version>/<profile>`, logged and exported with every run
    pub fn version(&self) -> String {
        format!("{}/{}", RULES_VERSION, self.profile.name())
    }

    /// Whether the item exposes every eligibility key
    pub fn is_eligible(&self, item: &Map<String, Value>) -> bool {
        self.eligibility.iter().all(|key| item.contains_key(key))
    }

    pub fn classify(&self, stats: &ItemStats) -> Label {
        evaluate(self.profile.rules(), &self.thresholds, stats)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}
