//! Explicit state for the interactive tag editor. One value owns the whole
//! edit flow, so there is no mutable form state scattered across prompts.

use std::collections::BTreeMap;

/// Server-reported validation messages, keyed by field.
pub type FormErrors = BTreeMap<String, String>;

/// What a submit will send to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSubmit {
    Create { name: String, parent_id: Option<i64> },
    Update { id: i64, name: String },
}

/// The tag editor's form state.
///
/// `Idle -> EditingExisting | AddingNew -> Submitting -> Idle` on success;
/// a validation failure returns to the editing state carrying field errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagForm {
    Idle,
    EditingExisting {
        id: i64,
        name: String,
        errors: FormErrors,
    },
    AddingNew {
        parent_id: Option<i64>,
        name: String,
        errors: FormErrors,
    },
    Submitting(TagSubmit),
}

impl TagForm {
    /// Begin renaming an existing tag.
    #[must_use]
    pub fn open_edit(self, id: i64, name: impl Into<String>) -> Self {
        TagForm::EditingExisting {
            id,
            name: name.into(),
            errors: FormErrors::new(),
        }
    }

    /// Begin adding a tag under `parent_id` (None for a root tag).
    #[must_use]
    pub fn open_add(self, parent_id: Option<i64>) -> Self {
        TagForm::AddingNew {
            parent_id,
            name: String::new(),
            errors: FormErrors::new(),
        }
    }

    /// Replace the name field, clearing stale field errors.
    #[must_use]
    pub fn with_name(self, new_name: impl Into<String>) -> Self {
        match self {
            TagForm::EditingExisting { id, .. } => TagForm::EditingExisting {
                id,
                name: new_name.into(),
                errors: FormErrors::new(),
            },
            TagForm::AddingNew { parent_id, .. } => TagForm::AddingNew {
                parent_id,
                name: new_name.into(),
                errors: FormErrors::new(),
            },
            other => other,
        }
    }

    /// Move to `Submitting`, returning the request to send. A submit from
    /// `Idle` or an already-submitting form has nothing to send.
    pub fn submit(self) -> Result<(Self, TagSubmit), Self> {
        match self {
            TagForm::EditingExisting { id, name, .. } => {
                let submit = TagSubmit::Update { id, name };
                Ok((TagForm::Submitting(submit.clone()), submit))
            }
            TagForm::AddingNew {
                parent_id, name, ..
            } => {
                let submit = TagSubmit::Create { name, parent_id };
                Ok((TagForm::Submitting(submit.clone()), submit))
            }
            other => Err(other),
        }
    }

    /// The server accepted the submit: reset to `Idle`.
    #[must_use]
    pub fn succeed(self) -> Self {
        TagForm::Idle
    }

    /// The server rejected the submit: return to the editing state with the
    /// reported field errors attached.
    #[must_use]
    pub fn fail(self, field_errors: FormErrors) -> Self {
        match self {
            TagForm::Submitting(TagSubmit::Update { id, name }) => TagForm::EditingExisting {
                id,
                name,
                errors: field_errors,
            },
            TagForm::Submitting(TagSubmit::Create { name, parent_id }) => TagForm::AddingNew {
                parent_id,
                name,
                errors: field_errors,
            },
            other => other,
        }
    }

    #[must_use]
    pub fn errors(&self) -> Option<&FormErrors> {
        match self {
            TagForm::EditingExisting { errors, .. } | TagForm::AddingNew { errors, .. }
                if !errors.is_empty() =>
            {
                Some(errors)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_submit_success_resets_to_idle() {
        let form = TagForm::Idle.open_edit(3, "work").with_name("projects");
        let (form, submit) = form.submit().expect("submittable");
        assert_eq!(
            submit,
            TagSubmit::Update {
                id: 3,
                name: "projects".to_string()
            }
        );
        assert_eq!(form.succeed(), TagForm::Idle);
    }

    #[test]
    fn add_submit_failure_returns_to_editing_with_errors() {
        let form = TagForm::Idle.open_add(Some(7)).with_name("");
        let (form, submit) = form.submit().expect("submittable");
        assert_eq!(
            submit,
            TagSubmit::Create {
                name: String::new(),
                parent_id: Some(7)
            }
        );

        let mut errors = FormErrors::new();
        errors.insert("name".to_string(), "Tag name cannot be empty".to_string());
        let form = form.fail(errors.clone());

        match &form {
            TagForm::AddingNew {
                parent_id,
                name,
                errors: reported,
            } => {
                assert_eq!(*parent_id, Some(7));
                assert!(name.is_empty());
                assert_eq!(reported, &errors);
            }
            other => panic!("expected AddingNew, got {other:?}"),
        }
        assert!(form.errors().is_some());
    }

    #[test]
    fn add_root_uses_no_parent() {
        let form = TagForm::Idle.open_add(None).with_name("inbox");
        let (_, submit) = form.submit().expect("submittable");
        assert_eq!(
            submit,
            TagSubmit::Create {
                name: "inbox".to_string(),
                parent_id: None
            }
        );
    }

    #[test]
    fn idle_cannot_submit() {
        assert!(TagForm::Idle.submit().is_err());
    }

    #[test]
    fn renaming_clears_previous_errors() {
        let mut errors = FormErrors::new();
        errors.insert("name".to_string(), "taken".to_string());
        let form = TagForm::EditingExisting {
            id: 1,
            name: "old".to_string(),
            errors,
        };
        assert!(form.errors().is_some());
        let form = form.with_name("fresh");
        assert!(form.errors().is_none());
    }
}
