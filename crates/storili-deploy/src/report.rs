//! Human-readable command output.

use crate::{AgentHealth, AuditRow, DeleteOutcome, DeployAction, DeployReport, RemoteListing};
use std::io::{self, Write};
use storili_registry::RegistryEntry;
use storili_types::StoryId;

pub fn write_deploy(out: &mut impl Write, report: &DeployReport) -> io::Result<()> {
    let story = &report.story_id;
    let agent = &report.agent_id;
    match report.action {
        DeployAction::Created => writeln!(out, "✓ Created {story} ({agent})"),
        DeployAction::Updated => writeln!(out, "✓ Updated {story} ({agent})"),
        DeployAction::Unchanged => writeln!(out, "✓ {story} unchanged ({agent})"),
    }
}

/// Reminds the operator to refresh the proxy after new agents were created.
pub fn write_binding_hint(out: &mut impl Write, reports: &[DeployReport]) -> io::Result<()> {
    let created: Vec<&DeployReport> = reports
        .iter()
        .filter(|r| r.action == DeployAction::Created)
        .collect();
    if created.is_empty() {
        return Ok(());
    }
    writeln!(out, "\nAdd to the proxy's [access.bindings]:")?;
    for report in created {
        writeln!(out, "  {} = \"{}\"", report.story_id, report.agent_id)?;
    }
    writeln!(out, "or run `storili-deploy bindings` for the full table.")
}

pub fn write_status(out: &mut impl Write, entries: &[(StoryId, RegistryEntry)]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "No agents deployed yet.");
    }
    writeln!(out, "Deployed Agents:\n")?;
    for (story_id, entry) in entries {
        writeln!(out, "  {story_id}")?;
        writeln!(out, "    Agent ID:    {}", entry.agent_id)?;
        writeln!(out, "    Deployed:    {}", entry.deployed_at.to_rfc3339())?;
        writeln!(out, "    Config hash: {}...", entry.config_hash.short())?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_audit(out: &mut impl Write, rows: &[AuditRow]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No agents deployed yet.");
    }
    for row in rows {
        let verdict = match &row.health {
            AgentHealth::Live => "live".to_string(),
            AgentHealth::Missing => "MISSING on platform".to_string(),
            AgentHealth::Unreachable(reason) => format!("unknown ({reason})"),
        };
        writeln!(out, "  {:<24} {:<32} {verdict}", row.story_id, row.entry.agent_id)?;
    }
    Ok(())
}

pub fn write_remote(out: &mut impl Write, listing: &[RemoteListing]) -> io::Result<()> {
    if listing.is_empty() {
        return writeln!(out, "No agents on the platform.");
    }
    for agent in listing {
        let tracked = match &agent.story_id {
            Some(story_id) => story_id.as_str(),
            None => "(untracked)",
        };
        writeln!(out, "  {:<32} {:<24} {}", agent.agent_id, tracked, agent.name)?;
    }
    Ok(())
}

pub fn write_delete(
    out: &mut impl Write,
    outcome: &DeleteOutcome,
    agent_id: &str,
) -> io::Result<()> {
    match outcome {
        DeleteOutcome::Deleted { story_id } => {
            writeln!(out, "✓ Deleted {story_id} ({agent_id})")
        }
        DeleteOutcome::Cancelled { .. } => writeln!(out, "Cancelled."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storili_types::ConfigFingerprint;

    fn story(id: &str) -> StoryId {
        StoryId::new(id).unwrap()
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn report(id: &str, action: DeployAction) -> DeployReport {
        DeployReport {
            story_id: story(id),
            agent_id: format!("agent-{id}"),
            action,
            fingerprint: ConfigFingerprint::from_hex("ab".repeat(32)),
        }
    }

    #[test]
    fn deploy_lines() {
        let created = render(|o| write_deploy(o, &report("pigs", DeployAction::Created)));
        assert_eq!(created, "✓ Created pigs (agent-pigs)\n");
        let same = render(|o| write_deploy(o, &report("pigs", DeployAction::Unchanged)));
        assert_eq!(same, "✓ pigs unchanged (agent-pigs)\n");
    }

    #[test]
    fn binding_hint_only_for_created_agents() {
        let reports = [
            report("a", DeployAction::Unchanged),
            report("b", DeployAction::Updated),
        ];
        assert_eq!(render(|o| write_binding_hint(o, &reports)), "");

        let reports = [report("c", DeployAction::Created)];
        let hint = render(|o| write_binding_hint(o, &reports));
        assert!(hint.contains("c = \"agent-c\""));
    }

    #[test]
    fn status_shows_short_hash() {
        assert_eq!(render(|o| write_status(o, &[])), "No agents deployed yet.\n");

        let hash = ConfigFingerprint::from_hex("0123456789abcdef".repeat(4));
        let entry = RegistryEntry::deployed_now("agent-1", hash);
        let text = render(|o| write_status(o, &[(story("pigs"), entry)]));
        assert!(text.starts_with("Deployed Agents:\n"));
        assert!(text.contains("    Agent ID:    agent-1\n"));
        assert!(text.contains("    Config hash: 0123456789abcdef...\n"));
    }

    #[test]
    fn delete_outcomes() {
        let cancelled = DeleteOutcome::Cancelled {
            story_id: story("pigs"),
        };
        assert_eq!(render(|o| write_delete(o, &cancelled, "agent-1")), "Cancelled.\n");
        let deleted = DeleteOutcome::Deleted {
            story_id: story("pigs"),
        };
        assert_eq!(
            render(|o| write_delete(o, &deleted, "agent-1")),
            "✓ Deleted pigs (agent-1)\n"
        );
    }

    #[test]
    fn remote_marks_untracked_agents() {
        let listing = [RemoteListing {
            agent_id: "agent-x".to_string(),
            name: "Storili - Old".to_string(),
            story_id: None,
        }];
        assert!(render(|o| write_remote(o, &listing)).contains("(untracked)"));
    }
}
