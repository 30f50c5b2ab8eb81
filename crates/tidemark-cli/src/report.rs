use tidemark_db::{MigrationEvent, MigrationStatus};

pub fn event_line(event: &MigrationEvent) -> String {
    match event {
        MigrationEvent::Applied { name, version } => format!("  applied      {version:>4}  {name}"),
        MigrationEvent::RolledBack { name } => format!("  rolled back        {name}"),
    }
}

pub fn status_line(status: &MigrationStatus) -> String {
    match status {
        MigrationStatus::Pending { name } => format!("  pending            {name}"),
        MigrationStatus::Applied {
            name,
            version,
            applied_at,
        } => format!(
            "  applied      {version:>4}  {name}  ({})",
            applied_at.format("%Y-%m-%d %H:%M:%S")
        ),
        // Not registered any more, so it cannot be rolled back.
        MigrationStatus::Unknown { name, version, .. } => {
            format!("  unknown      {version:>4}  {name}")
        }
    }
}
