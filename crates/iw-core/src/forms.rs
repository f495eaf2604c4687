//! # Form Configuration
//!
//! Static per-entity form metadata plus cleaning of submitted data. The
//! editable field set is enumerated here once; handlers and templates both
//! read it, so labels and help texts never drift apart.

use serde::Deserialize;
use uuid::Uuid;

/// Presentation metadata for a single form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub required: bool,
}

/// The editable fields of a post. `author` and `pub_date` are deliberately
/// not here: they are server-assigned and immutable.
pub const POST_FIELDS: [FieldSpec; 3] = [
    FieldSpec {
        name: "text",
        label: "Post text",
        help_text: "Enter the post text",
        required: true,
    },
    FieldSpec {
        name: "group",
        label: "Group",
        help_text: "The group this post will belong to",
        required: false,
    },
    FieldSpec {
        name: "image",
        label: "Image",
        help_text: "Optional image attachment",
        required: false,
    },
];

pub const COMMENT_FIELDS: [FieldSpec; 1] = [FieldSpec {
    name: "text",
    label: "Comment",
    help_text: "Enter the comment text",
    required: true,
}];

/// A single inline validation failure, rendered next to the form.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Raw submitted post data, before cleaning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    pub text: String,
    /// Group id as submitted by the select widget; empty means "no group".
    #[serde(default)]
    pub group: String,
    /// Media id of an already-stored upload, filled in by the handler.
    #[serde(skip)]
    pub image: Option<String>,
}

/// A cleaned post submission, ready for the mutation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

impl PostForm {
    /// Validates field constraints and produces a draft, or the list of
    /// inline errors to re-render the form with. Nothing is persisted here.
    pub fn clean(&self) -> Result<PostDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let text = self.text.trim();
        if text.is_empty() {
            errors.push(FieldError {
                field: "text",
                message: "This field is required.".to_string(),
            });
        }

        let group_id = if self.group.trim().is_empty() {
            None
        } else {
            match Uuid::parse_str(self.group.trim()) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push(FieldError {
                        field: "group",
                        message: "Select a valid group.".to_string(),
                    });
                    None
                }
            }
        };

        if errors.is_empty() {
            Ok(PostDraft {
                text: text.to_string(),
                group_id,
                image: self.image.clone(),
            })
        } else {
            Err(errors)
        }
    }
}

/// Raw submitted comment data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, Vec<FieldError>> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(vec![FieldError {
                field: "text",
                message: "This field is required.".to_string(),
            }]);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        let form = PostForm {
            text: "   \n".to_string(),
            ..Default::default()
        };
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "text");
    }

    #[test]
    fn empty_group_means_none() {
        let form = PostForm {
            text: "hello".to_string(),
            group: "".to_string(),
            image: None,
        };
        let draft = form.clean().unwrap();
        assert_eq!(draft.text, "hello");
        assert_eq!(draft.group_id, None);
    }

    #[test]
    fn malformed_group_id_is_an_inline_error() {
        let form = PostForm {
            text: "hello".to_string(),
            group: "not-a-uuid".to_string(),
            image: None,
        };
        let errors = form.clean().unwrap_err();
        assert_eq!(errors[0].field, "group");
    }

    #[test]
    fn text_is_trimmed() {
        let form = PostForm {
            text: "  hello  ".to_string(),
            ..Default::default()
        };
        assert_eq!(form.clean().unwrap().text, "hello");
    }

    #[test]
    fn comment_cleaning_mirrors_post_text_rule() {
        assert!(CommentForm { text: " ".into() }.clean().is_err());
        assert_eq!(
            CommentForm { text: " fine ".into() }.clean().unwrap(),
            "fine"
        );
    }

    #[test]
    fn post_field_table_never_exposes_pub_date_or_author() {
        assert!(POST_FIELDS.iter().all(|f| f.name != "pub_date" && f.name != "author"));
    }
}
