//! Attribute metadata carried by Insert and Retain ops
//!
//! A [`Meta`] records formatting and authorship for the span an op
//! covers. Every attribute is optional: an absent attribute means "this
//! op does not say anything about it", which is what lets a formatting
//! retain touch `bold` without clobbering `italic`.

use serde::{Deserialize, Serialize};

/// Authorship identifier
pub type UserId = u32;

/// Every attribute a [`Meta`] can carry, in wire bit order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    Bold,
    Italic,
    Underline,
    Strike,
    FontSize,
    UserId,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Bold,
        Attribute::Italic,
        Attribute::Underline,
        Attribute::Strike,
        Attribute::FontSize,
        Attribute::UserId,
    ];

    /// Bit of this attribute in a change-mask
    pub fn bit(self) -> u32 {
        match self {
            Attribute::Bold => 1,
            Attribute::Italic => 2,
            Attribute::Underline => 4,
            Attribute::Strike => 8,
            Attribute::FontSize => 16,
            Attribute::UserId => 32,
        }
    }
}

/// Boolean style flags (the attributes `toggle_meta` can flip)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    Bold,
    Italic,
    Underline,
    Strike,
}

impl Style {
    pub const ALL: [Style; 4] = [Style::Bold, Style::Italic, Style::Underline, Style::Strike];

    pub fn attribute(self) -> Attribute {
        match self {
            Style::Bold => Attribute::Bold,
            Style::Italic => Attribute::Italic,
            Style::Underline => Attribute::Underline,
            Style::Strike => Attribute::Strike,
        }
    }

    fn class_name(self) -> &'static str {
        match self {
            Style::Bold => "bold",
            Style::Italic => "italic",
            Style::Underline => "underline",
            Style::Strike => "strike",
        }
    }
}

/// Formatting and authorship of a span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike: Option<bool>,
    /// Font-size level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    /// Author of the span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl Meta {
    /// Meta with a single style flag set
    pub fn styled(style: Style, on: bool) -> Self {
        Self::default().with_style(style, on)
    }

    /// Meta carrying only authorship
    pub fn authored(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: Style, on: bool) -> Self {
        *self.style_slot(style) = Some(on);
        self
    }

    pub fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changemask() == 0
    }

    /// Value of a style flag, if this meta specifies it
    pub fn style(&self, style: Style) -> Option<bool> {
        match style {
            Style::Bold => self.bold,
            Style::Italic => self.italic,
            Style::Underline => self.underline,
            Style::Strike => self.strike,
        }
    }

    /// Whether the style flag is explicitly on
    pub fn is_on(&self, style: Style) -> bool {
        self.style(style) == Some(true)
    }

    fn style_slot(&mut self, style: Style) -> &mut Option<bool> {
        match style {
            Style::Bold => &mut self.bold,
            Style::Italic => &mut self.italic,
            Style::Underline => &mut self.underline,
            Style::Strike => &mut self.strike,
        }
    }

    pub fn has(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Bold => self.bold.is_some(),
            Attribute::Italic => self.italic.is_some(),
            Attribute::Underline => self.underline.is_some(),
            Attribute::Strike => self.strike.is_some(),
            Attribute::FontSize => self.font_size.is_some(),
            Attribute::UserId => self.user_id.is_some(),
        }
    }

    /// Bit-set of the attributes present
    pub fn changemask(&self) -> u32 {
        Attribute::ALL
            .iter()
            .filter(|attr| self.has(**attr))
            .fold(0, |mask, attr| mask | attr.bit())
    }

    /// Overlay `newer` on top of `self`: attributes `newer` specifies win,
    /// the rest are kept.
    pub fn merge(&self, newer: &Meta) -> Meta {
        Meta {
            bold: newer.bold.or(self.bold),
            italic: newer.italic.or(self.italic),
            underline: newer.underline.or(self.underline),
            strike: newer.strike.or(self.strike),
            font_size: newer.font_size.or(self.font_size),
            user_id: newer.user_id.or(self.user_id),
        }
    }

    /// Drop every attribute that `other` specifies
    pub fn without(&self, other: &Meta) -> Meta {
        Meta {
            bold: self.bold.filter(|_| other.bold.is_none()),
            italic: self.italic.filter(|_| other.italic.is_none()),
            underline: self.underline.filter(|_| other.underline.is_none()),
            strike: self.strike.filter(|_| other.strike.is_none()),
            font_size: self.font_size.filter(|_| other.font_size.is_none()),
            user_id: self.user_id.filter(|_| other.user_id.is_none()),
        }
    }

    /// The meta that undoes `self` over a span whose formatting was `prior`.
    ///
    /// Only the attributes `self` changes are specified; where `prior` had
    /// no value the attribute restores to off / zero. Authorship restores
    /// to whatever `prior` held.
    pub fn restore_from(&self, prior: &Meta) -> Meta {
        let flag = |changed: Option<bool>, before: Option<bool>| {
            changed.map(|_| before.unwrap_or(false))
        };
        Meta {
            bold: flag(self.bold, prior.bold),
            italic: flag(self.italic, prior.italic),
            underline: flag(self.underline, prior.underline),
            strike: flag(self.strike, prior.strike),
            font_size: self.font_size.map(|_| prior.font_size.unwrap_or(0)),
            user_id: self.user_id.and(prior.user_id),
        }
    }

    /// Encode as a host class string (`" padtext-bold padtext--italic ... author-7"`)
    pub fn to_css_classes(&self) -> String {
        let mut classes = String::new();
        for style in Style::ALL {
            match self.style(style) {
                Some(true) => classes.push_str(" padtext-"),
                _ => classes.push_str(" padtext--"),
            }
            classes.push_str(style.class_name());
        }
        classes.push_str(&format!(" padtext-fontSize{}", self.font_size.unwrap_or(0)));
        classes.push_str(&format!(" author-{}", self.user_id.unwrap_or(0)));
        classes
    }

    /// Decode a class string produced by [`Meta::to_css_classes`].
    ///
    /// Unknown classes are ignored; a zero font size or author decodes
    /// to "unset".
    pub fn from_css_classes(classes: &str) -> Meta {
        let mut meta = Meta::default();
        for class in classes.split_whitespace() {
            if let Some(rest) = class.strip_prefix("padtext-") {
                if let Some(size) = rest.strip_prefix("fontSize") {
                    meta.font_size = size.parse().ok().filter(|size| *size != 0);
                    continue;
                }
                let (name, on) = match rest.strip_prefix('-') {
                    Some(name) => (name, false),
                    None => (rest, true),
                };
                if let Some(style) = Style::ALL.iter().find(|s| s.class_name() == name) {
                    *meta.style_slot(*style) = Some(on);
                }
            } else if let Some(author) = class.strip_prefix("author-") {
                meta.user_id = author.parse().ok().filter(|id| *id != 0);
            }
        }
        meta
    }
}
