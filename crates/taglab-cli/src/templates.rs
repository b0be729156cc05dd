/// Generated tables and provider handles; briefs.json stays tracked.
pub const GITIGNORE: &str = r#"data/*
!data/briefs.json
"#;
