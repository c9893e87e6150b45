use inquire::Text;
use serde::Serialize;

use super::credentials::load_credentials;
use super::form::{TagForm, TagSubmit};
use super::http_client::{ApiClient, ApiFailure};
use super::pickers::{TagNodeDisplay, confirm_action, pick_parent, pick_tag, print_tag_tree, tree_to_displays};
use crate::types::Tag;

#[derive(Serialize)]
struct CreateTagRequest {
    name: String,
    parent_id: Option<i64>,
}

#[derive(Serialize)]
struct RenameTagRequest {
    name: String,
}

fn send_submit(client: &ApiClient, submit: &TagSubmit) -> Result<Tag, ApiFailure> {
    match submit {
        TagSubmit::Create { name, parent_id } => client.post(
            "/tags",
            &CreateTagRequest {
                name: name.clone(),
                parent_id: *parent_id,
            },
        ),
        TagSubmit::Update { id, name } => client.put(
            &format!("/tags/{id}"),
            &RenameTagRequest { name: name.clone() },
        ),
    }
}

fn print_form_errors(form: &TagForm) {
    if let Some(errors) = form.errors() {
        println!();
        for (field, message) in errors {
            eprintln!("  {field}: {message}");
        }
        println!();
    }
}

/// Run `form` to completion against the server, re-prompting for the name
/// whenever the server reports field errors.
fn drive_form(
    client: &ApiClient,
    mut form: TagForm,
    initial_name: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<Tag> {
    let mut initial_name = initial_name;

    loop {
        let entered = if let Some(name) = initial_name.take() {
            name
        } else if non_interactive {
            anyhow::bail!("--name is required in non-interactive mode");
        } else {
            print_form_errors(&form);
            Text::new("Tag name:").prompt()?
        };

        form = form.with_name(entered);

        let (submitting, submit) = match form.submit() {
            Ok(pair) => pair,
            Err(returned) => {
                form = returned;
                continue;
            }
        };

        match send_submit(client, &submit) {
            Ok(tag) => return Ok(tag),
            Err(failure) if !failure.fields.is_empty() && !non_interactive => {
                form = submitting.fail(failure.fields);
            }
            Err(failure) => return Err(failure.into()),
        }
    }
}

pub fn run_tag_list(flat: bool) -> anyhow::Result<()> {
    let creds = load_credentials()?;
    let client = ApiClient::new(&creds)?;

    let tags: Vec<Tag> = client.get("/tags")?;

    if flat {
        if tags.is_empty() {
            println!("No tags found.");
            return Ok(());
        }
        println!();
        for tag in &tags {
            println!("  {}  ({})", tag.name, tag.id);
        }
        println!();
    } else {
        print_tag_tree(&tags);
    }

    Ok(())
}

pub fn run_tag_add(
    name: Option<String>,
    parent_id: Option<i64>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let creds = load_credentials()?;
    let client = ApiClient::new(&creds)?;

    let parent_id = if parent_id.is_some() || non_interactive {
        parent_id
    } else {
        let tags: Vec<Tag> = client.get("/tags")?;
        match pick_parent(&tags)? {
            Some(choice) => choice,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    };

    let form = TagForm::Idle.open_add(parent_id);
    let tag = drive_form(&client, form, name, non_interactive)?;

    println!();
    println!("Created tag '{}'", tag.name);
    println!();

    Ok(())
}

pub fn run_tag_rename(
    tag_id: Option<i64>,
    name: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let creds = load_credentials()?;
    let client = ApiClient::new(&creds)?;

    let tags: Vec<Tag> = client.get("/tags")?;

    let target = match resolve_tag(&tags, tag_id, non_interactive, "Select tag to rename:", false)?
    {
        Some(t) => t,
        None => {
            println!("Cancelled.");
            return Ok(());
        }
    };

    let form = TagForm::Idle.open_edit(target.id, target.name.clone());
    let tag = drive_form(&client, form, name, non_interactive)?;

    println!();
    println!("Renamed tag to '{}'", tag.name);
    println!();

    Ok(())
}

pub fn run_tag_remove(
    tag_id: Option<i64>,
    non_interactive: bool,
    yes: bool,
    force: bool,
) -> anyhow::Result<()> {
    let creds = load_credentials()?;
    let client = ApiClient::new(&creds)?;

    let tags: Vec<Tag> = client.get("/tags")?;

    // Tags that still have children are only selectable with --force.
    let target = match resolve_tag(
        &tags,
        tag_id,
        non_interactive,
        "Select tag to remove:",
        !force,
    )? {
        Some(t) => t,
        None => {
            println!("Cancelled.");
            return Ok(());
        }
    };

    if target.has_children && !force {
        anyhow::bail!(
            "Tag '{}' has child tags. Pass --force to delete it and reparent them.",
            target.name
        );
    }

    let confirmed = confirm_action(
        &format!("Delete tag '{}'?", target.name),
        yes,
        non_interactive,
    )?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    let path = if force {
        format!("/tags/{}?force=true", target.id)
    } else {
        format!("/tags/{}", target.id)
    };

    client.delete(&path)?;

    println!();
    println!("Deleted tag '{}'", target.name);
    println!();

    Ok(())
}

fn resolve_tag(
    tags: &[Tag],
    tag_id: Option<i64>,
    non_interactive: bool,
    message: &str,
    leaves_only: bool,
) -> anyhow::Result<Option<TagNodeDisplay>> {
    if let Some(id) = tag_id {
        tree_to_displays(tags)
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| anyhow::anyhow!("Tag not found: {}", id))
            .map(Some)
    } else if non_interactive {
        anyhow::bail!("--tag-id is required in non-interactive mode");
    } else {
        pick_tag(tags, message, leaves_only)
    }
}
