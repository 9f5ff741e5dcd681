//! Transmission request payload
//!
//! `Recipient` and `Content` are decided per value:
//! - a recipient object with a non-null `address` is inline, anything else is
//!   a stored-list reference (bare string or `{"list_id": ...}`);
//! - content with a non-null `subject` is inline, anything else is a template
//!   reference.
//!
//! Entries that satisfy both shapes are rejected as ambiguous.

use chrono::{DateTime, FixedOffset};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{has_non_null, json_kind, JsonObject};
use crate::error::{SchemaError, SchemaShape};

/// A bulk send request submitted to `/v1/transmissions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transmission {
    /// Recipients, in submission order
    pub recipients: Vec<Recipient>,

    /// Message content
    pub content: Content,

    /// Delivery-control flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<TransmissionOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonObject>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution_data: Option<JsonObject>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_path: Option<String>,
}

impl Transmission {
    /// Create a transmission with the required fields only
    pub fn new(recipients: Vec<Recipient>, content: impl Into<Content>) -> Self {
        Self {
            recipients,
            content: content.into(),
            options: None,
            campaign_id: None,
            description: None,
            metadata: None,
            substitution_data: None,
            return_path: None,
        }
    }

    /// Start a builder
    pub fn builder() -> TransmissionBuilder {
        TransmissionBuilder::default()
    }

    /// Coerce a loosely typed JSON value into a validated transmission
    pub fn coerce(value: Value) -> Result<Self, SchemaError> {
        let transmission: Transmission = serde_json::from_value(value)
            .map_err(|e| SchemaError::single(SchemaShape::Request, e.to_string()))?;
        transmission.validate()?;
        Ok(transmission)
    }

    /// Check the invariants serde cannot express.
    ///
    /// Every violation is reported, each prefixed with the path of the
    /// offending field.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut violations = Vec::new();

        if self.recipients.is_empty() {
            violations.push("recipients: must contain at least one recipient".to_string());
        }
        for (index, recipient) in self.recipients.iter().enumerate() {
            recipient.check(&format!("recipients[{}]", index), &mut violations);
        }
        self.content.check("content", &mut violations);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::new(SchemaShape::Request, violations))
        }
    }

    /// Effective sandbox flag carried by the payload itself
    pub fn sandbox(&self) -> Option<bool> {
        self.options.as_ref().and_then(|o| o.sandbox)
    }
}

/// Delivery-control flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransmissionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_tracking: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_tracking: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactional: Option<bool>,

    /// Route through the sandbox domain instead of sending real mail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_pool: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_css: Option<bool>,

    /// Scheduled send time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// An email address with an optional display name.
///
/// Accepts either a bare email string or the object form on input; always
/// serializes as the object form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_to: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddressFields {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    header_to: Option<String>,
}

impl Address {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            header_to: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn check(&self, path: &str, violations: &mut Vec<String>) {
        let email = self.email.trim();
        if email.is_empty() {
            violations.push(format!("{}.email: must not be empty", path));
        } else if !email.contains('@') {
            violations.push(format!("{}.email: `{}` is not an email address", path, email));
        }
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Address::new(email)
    }
}

impl From<String> for Address {
    fn from(email: String) -> Self {
        Address::new(email)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(email) => Ok(Address::new(email)),
            value @ Value::Object(_) => {
                let fields: AddressFields =
                    serde_json::from_value(value).map_err(de::Error::custom)?;
                Ok(Address {
                    email: fields.email,
                    name: fields.name,
                    header_to: fields.header_to,
                })
            }
            other => Err(de::Error::custom(format!(
                "address must be an email string or an object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

/// One entry of the recipient list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Recipient {
    /// Literal address with per-recipient data
    Inline(InlineRecipient),
    /// Reference to a stored recipient list
    List(ListReference),
}

/// A recipient given by literal address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InlineRecipient {
    pub address: Address,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonObject>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution_data: Option<JsonObject>,
}

impl InlineRecipient {
    pub fn new(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
            return_path: None,
            tags: Vec::new(),
            metadata: None,
            substitution_data: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_metadata(mut self, metadata: JsonObject) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_substitution_data(mut self, data: JsonObject) -> Self {
        self.substitution_data = Some(data);
        self
    }
}

/// Opaque stored-list id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListReference {
    pub list_id: String,
}

impl ListReference {
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
        }
    }
}

impl Recipient {
    /// Decide the recipient shape for a single decoded value
    fn from_value(value: Value) -> Result<Self, String> {
        let mut object = match value {
            Value::String(list_id) => return Ok(Recipient::List(ListReference::new(list_id))),
            Value::Object(object) => object,
            other => {
                return Err(format!(
                    "recipient must be an object or a list id string, found {}",
                    json_kind(&other)
                ))
            }
        };

        if has_non_null(&object, "address") {
            if has_non_null(&object, "list_id") {
                return Err("recipient is ambiguous: both `address` and `list_id` are present"
                    .to_string());
            }
            object.remove("list_id");
            return serde_json::from_value(Value::Object(object))
                .map(Recipient::Inline)
                .map_err(|e| format!("invalid inline recipient: {}", e));
        }

        if let Some(key) = object
            .keys()
            .find(|k| k.as_str() != "address" && k.as_str() != "list_id")
        {
            return Err(format!("unknown field `{}` on list recipient", key));
        }

        match object.remove("list_id") {
            Some(Value::String(list_id)) => Ok(Recipient::List(ListReference::new(list_id))),
            Some(other) => Err(format!(
                "`list_id` must be a string, found {}",
                json_kind(&other)
            )),
            None => Err("recipient has neither `address` nor `list_id`".to_string()),
        }
    }

    fn check(&self, path: &str, violations: &mut Vec<String>) {
        match self {
            Recipient::Inline(inline) => inline.address.check(&format!("{}.address", path), violations),
            Recipient::List(list) => {
                if list.list_id.trim().is_empty() {
                    violations.push(format!("{}.list_id: must not be empty", path));
                }
            }
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Recipient::Inline(_))
    }
}

impl<'de> Deserialize<'de> for Recipient {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Recipient::from_value(value).map_err(de::Error::custom)
    }
}

impl From<InlineRecipient> for Recipient {
    fn from(recipient: InlineRecipient) -> Self {
        Recipient::Inline(recipient)
    }
}

impl From<ListReference> for Recipient {
    fn from(list: ListReference) -> Self {
        Recipient::List(list)
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Message content: literal body or stored template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Inline(InlineContent),
    Template(TemplateReference),
}

/// Literal message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InlineContent {
    pub subject: String,

    pub from: Address,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl InlineContent {
    pub fn new(subject: impl Into<String>, from: impl Into<Address>) -> Self {
        Self {
            subject: subject.into(),
            from: from.into(),
            html: None,
            text: None,
            headers: None,
            reply_to: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

/// Reference to a stored template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateReference {
    pub template_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_draft_template: Option<bool>,
}

impl TemplateReference {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            use_draft_template: None,
        }
    }

    /// Use the draft version of the template
    pub fn draft(mut self) -> Self {
        self.use_draft_template = Some(true);
        self
    }
}

impl Content {
    fn from_value(value: Value) -> Result<Self, String> {
        let mut object = match value {
            Value::Object(object) => object,
            other => return Err(format!("content must be an object, found {}", json_kind(&other))),
        };

        if has_non_null(&object, "subject") {
            if has_non_null(&object, "template_id") {
                return Err(
                    "content is ambiguous: both `subject` and `template_id` are present".to_string(),
                );
            }
            object.remove("template_id");
            return serde_json::from_value(Value::Object(object))
                .map(Content::Inline)
                .map_err(|e| format!("invalid inline content: {}", e));
        }

        object.remove("subject");
        serde_json::from_value(Value::Object(object))
            .map(Content::Template)
            .map_err(|e| format!("invalid template content: {}", e))
    }

    fn check(&self, path: &str, violations: &mut Vec<String>) {
        match self {
            Content::Inline(inline) => {
                inline.from.check(&format!("{}.from", path), violations);
                if inline.html.is_none() && inline.text.is_none() {
                    violations.push(format!("{}: inline content needs `html` or `text`", path));
                }
            }
            Content::Template(template) => {
                if template.template_id.trim().is_empty() {
                    violations.push(format!("{}.template_id: must not be empty", path));
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Content::from_value(value).map_err(de::Error::custom)
    }
}

impl From<InlineContent> for Content {
    fn from(content: InlineContent) -> Self {
        Content::Inline(content)
    }
}

impl From<TemplateReference> for Content {
    fn from(template: TemplateReference) -> Self {
        Content::Template(template)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`Transmission`]; `build` validates the result
#[derive(Debug, Default)]
pub struct TransmissionBuilder {
    recipients: Vec<Recipient>,
    content: Option<Content>,
    options: Option<TransmissionOptions>,
    campaign_id: Option<String>,
    description: Option<String>,
    metadata: Option<JsonObject>,
    substitution_data: Option<JsonObject>,
    return_path: Option<String>,
}

impl TransmissionBuilder {
    pub fn recipient(mut self, recipient: impl Into<Recipient>) -> Self {
        self.recipients.push(recipient.into());
        self
    }

    pub fn recipients<I, R>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Recipient>,
    {
        self.recipients.extend(recipients.into_iter().map(Into::into));
        self
    }

    pub fn content(mut self, content: impl Into<Content>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn options(mut self, options: TransmissionOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn campaign_id(mut self, campaign_id: impl Into<String>) -> Self {
        self.campaign_id = Some(campaign_id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn metadata(mut self, metadata: JsonObject) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn substitution_data(mut self, data: JsonObject) -> Self {
        self.substitution_data = Some(data);
        self
    }

    pub fn return_path(mut self, return_path: impl Into<String>) -> Self {
        self.return_path = Some(return_path.into());
        self
    }

    pub fn build(self) -> Result<Transmission, SchemaError> {
        let content = self
            .content
            .ok_or_else(|| SchemaError::single(SchemaShape::Request, "content: is required"))?;

        let transmission = Transmission {
            recipients: self.recipients,
            content,
            options: self.options,
            campaign_id: self.campaign_id,
            description: self.description,
            metadata: self.metadata,
            substitution_data: self.substitution_data,
            return_path: self.return_path,
        };
        transmission.validate()?;
        Ok(transmission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inline_content() -> Value {
        json!({"subject": "Hello", "from": "sender@example.com", "text": "hi"})
    }

    #[test]
    fn test_recipient_with_address_is_inline() {
        let recipient: Recipient =
            serde_json::from_value(json!({"address": "a@example.com", "tags": ["x"]})).unwrap();
        match recipient {
            Recipient::Inline(inline) => {
                assert_eq!(inline.address.email, "a@example.com");
                assert_eq!(inline.tags, vec!["x".to_string()]);
            }
            other => panic!("expected inline recipient, got {:?}", other),
        }
    }

    #[test]
    fn test_recipient_string_is_list_reference() {
        let recipient: Recipient = serde_json::from_value(json!("newsletter-2024")).unwrap();
        assert_eq!(recipient, Recipient::List(ListReference::new("newsletter-2024")));
    }

    #[test]
    fn test_recipient_null_address_falls_back_to_list() {
        let recipient: Recipient =
            serde_json::from_value(json!({"address": null, "list_id": "vip"})).unwrap();
        assert_eq!(recipient, Recipient::List(ListReference::new("vip")));
    }

    #[test]
    fn test_mixed_recipients_are_decided_per_value() {
        let value = json!({
            "recipients": [
                {"address": {"email": "a@example.com", "name": "A"}},
                "stored-list",
                {"list_id": "other-list"}
            ],
            "content": inline_content()
        });

        let transmission = Transmission::coerce(value).unwrap();
        assert!(transmission.recipients[0].is_inline());
        assert!(!transmission.recipients[1].is_inline());
        assert!(!transmission.recipients[2].is_inline());
    }

    #[test]
    fn test_recipient_with_address_and_list_id_is_rejected() {
        let err = serde_json::from_value::<Recipient>(
            json!({"address": "a@example.com", "list_id": "vip"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_recipient_without_either_field_is_rejected() {
        let err = serde_json::from_value::<Recipient>(json!({"name": "nobody"})).unwrap_err();
        assert!(err.to_string().contains("unknown field `name`"));

        let err = serde_json::from_value::<Recipient>(json!({})).unwrap_err();
        assert!(err.to_string().contains("neither"));

        let err = serde_json::from_value::<Recipient>(json!(42)).unwrap_err();
        assert!(err.to_string().contains("found number"));
    }

    #[test]
    fn test_content_with_subject_is_inline() {
        let content: Content = serde_json::from_value(inline_content()).unwrap();
        assert!(matches!(content, Content::Inline(_)));
    }

    #[test]
    fn test_content_without_subject_is_template() {
        let content: Content =
            serde_json::from_value(json!({"template_id": "welcome", "use_draft_template": true}))
                .unwrap();
        assert_eq!(content, Content::Template(TemplateReference::new("welcome").draft()));

        let content: Content =
            serde_json::from_value(json!({"subject": null, "template_id": "welcome"})).unwrap();
        assert_eq!(content, Content::Template(TemplateReference::new("welcome")));
    }

    #[test]
    fn test_content_with_subject_and_template_is_rejected() {
        let err = serde_json::from_value::<Content>(json!({
            "subject": "Hi",
            "from": "a@example.com",
            "text": "x",
            "template_id": "welcome"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_template_content_missing_id_is_rejected() {
        let err = serde_json::from_value::<Content>(json!({"from": "a@example.com"})).unwrap_err();
        assert!(err.to_string().contains("invalid template content"));
    }

    #[test]
    fn test_address_object_and_string_forms() {
        let plain: Address = serde_json::from_value(json!("a@example.com")).unwrap();
        let full: Address =
            serde_json::from_value(json!({"email": "a@example.com", "name": "A"})).unwrap();
        assert_eq!(plain, Address::new("a@example.com"));
        assert_eq!(full, Address::new("a@example.com").with_name("A"));
        assert_eq!(
            serde_json::to_value(&plain).unwrap(),
            json!({"email": "a@example.com"})
        );
    }

    #[test]
    fn test_validate_reports_every_violation() {
        let value = json!({
            "recipients": [{"address": ""}, {"list_id": " "}],
            "content": {"subject": "Hi", "from": "not-an-address"}
        });

        let err = Transmission::coerce(value).unwrap_err();
        assert_eq!(err.shape, SchemaShape::Request);
        assert_eq!(err.diagnostics.len(), 4);
        assert!(err.diagnostics[0].starts_with("recipients[0].address.email"));
        assert!(err.diagnostics[1].starts_with("recipients[1].list_id"));
        assert!(err.diagnostics.iter().any(|d| d.contains("`html` or `text`")));
    }

    #[test]
    fn test_empty_recipient_list_is_rejected() {
        let value = json!({"recipients": [], "content": {"template_id": "t"}});
        let err = Transmission::coerce(value).unwrap_err();
        assert!(err.diagnostics[0].contains("at least one recipient"));
    }

    #[test]
    fn test_unknown_top_level_field_is_rejected() {
        let value = json!({
            "recipients": ["list"],
            "content": {"template_id": "t"},
            "attachments": []
        });
        let err = Transmission::coerce(value).unwrap_err();
        assert!(err.diagnostics[0].contains("attachments"));
    }

    #[test]
    fn test_options_parse_start_time() {
        let value = json!({
            "recipients": ["list"],
            "content": {"template_id": "t"},
            "options": {"sandbox": false, "start_time": "2024-03-01T10:00:00+02:00"}
        });
        let transmission = Transmission::coerce(value).unwrap();
        let options = transmission.options.unwrap();
        assert_eq!(options.sandbox, Some(false));
        assert_eq!(options.start_time.unwrap().offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_builder_requires_content() {
        let err = Transmission::builder()
            .recipient(ListReference::new("list"))
            .build()
            .unwrap_err();
        assert_eq!(err.diagnostics, vec!["content: is required".to_string()]);
    }

    #[test]
    fn test_builder_produces_valid_transmission() {
        let transmission = Transmission::builder()
            .recipient(InlineRecipient::new("a@example.com").with_tag("vip"))
            .recipient(ListReference::new("list"))
            .content(InlineContent::new("Hi", "sender@example.com").with_html("<p>hi</p>"))
            .campaign_id("spring")
            .build()
            .unwrap();

        assert_eq!(transmission.recipients.len(), 2);
        assert_eq!(transmission.campaign_id.as_deref(), Some("spring"));
        assert_eq!(transmission.sandbox(), None);
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let transmission = Transmission::new(
            vec![Recipient::List(ListReference::new("list"))],
            TemplateReference::new("t"),
        );
        let value = serde_json::to_value(&transmission).unwrap();
        assert_eq!(
            value,
            json!({"recipients": [{"list_id": "list"}], "content": {"template_id": "t"}})
        );
    }
}
