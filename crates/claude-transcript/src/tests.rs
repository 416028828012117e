/// Parsing tests for session JSONL lines and the projects-directory lookup,
/// using payload shapes written by the Claude CLI.
#[cfg(test)]
mod unit {
    use crate::store::parse_session;
    use crate::types::{MessageTime, Role, SessionEntry, SessionsIndex};

    fn parse(jsonl: &str) -> Vec<crate::TranscriptMessage> {
        parse_session(std::io::Cursor::new(jsonl)).expect("failed to parse session")
    }

    #[test]
    fn keeps_only_user_and_assistant_lines() {
        let jsonl = concat!(
            r#"{"type":"summary","summary":"x"}"#,
            "\n",
            r#"{"type":"user","message":{"role":"user","content":"hello"}}"#,
            "\n",
            r#"{"type":"system","content":"ignored"}"#,
            "\n",
            r#"{"type":"assistant","message":{"role":"assistant","content":"hi"}}"#,
            "\n",
        );
        let msgs = parse(jsonl);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::User);
        assert_eq!(msgs[0].content, "hello");
        assert_eq!(msgs[1].role, Role::Assistant);
    }

    #[test]
    fn skips_invalid_json_lines() {
        let jsonl = "not json\n{\"type\":\"user\",\"message\":{\"content\":\"ok\"}}\n{broken\n";
        let msgs = parse(jsonl);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].content, "ok");
    }

    #[test]
    fn skips_lines_that_are_not_utf8() {
        let mut jsonl = b"{\"type\":\"user\",\"message\":{\"content\":\"first\"}}\n".to_vec();
        jsonl.extend_from_slice(b"\xff\xfe garbage\n");
        jsonl.extend_from_slice(b"{\"type\":\"assistant\",\"message\":{\"content\":\"second\"}}\r\n");
        let msgs = parse_session(std::io::Cursor::new(jsonl)).unwrap();
        let contents: Vec<_> = msgs.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn flattens_content_blocks() {
        let jsonl = r#"{"type":"assistant","message":{"role":"assistant","content":[
            {"type":"text","text":"Reading the paper."},
            {"type":"tool_use","id":"t1","name":"Read","input":{"path":"a.pdf"}},
            {"type":"tool_result","tool_use_id":"t1","content":"..."},
            {"type":"thinking","thinking":"hmm"},
            "bare string"
        ]}}"#
        .replace('\n', "");
        let msgs = parse(&jsonl);
        assert_eq!(
            msgs[0].content,
            "Reading the paper.\n[Tool call: Read]\n[Tool result received]\nbare string"
        );
    }

    #[test]
    fn timestamps_accept_millis_and_rfc3339() {
        let jsonl = concat!(
            r#"{"type":"user","timestamp":1700000000000,"message":{"content":"a"}}"#,
            "\n",
            r#"{"type":"user","timestamp":"2025-01-02T03:04:05.000Z","message":{"content":"b"}}"#,
            "\n",
            r#"{"type":"user","timestamp":"yesterday","message":{"content":"c"}}"#,
            "\n",
            r#"{"type":"user","message":{"content":"d"}}"#,
            "\n",
        );
        let msgs = parse(jsonl);
        assert_eq!(msgs[0].timestamp.to_string(), "2023-11-14 22:13:20 UTC");
        assert_eq!(msgs[1].timestamp.to_string(), "2025-01-02 03:04:05 UTC");
        assert_eq!(msgs[2].timestamp, MessageTime::Raw("yesterday".into()));
        assert_eq!(msgs[3].timestamp, MessageTime::Unknown);
    }

    #[test]
    fn role_falls_back_to_line_type() {
        let msgs = parse(r#"{"type":"assistant","message":{"content":"x"}}"#);
        assert_eq!(msgs[0].role, Role::Assistant);
    }

    #[test]
    fn newest_session_by_mtime() {
        let index = SessionsIndex {
            entries: vec![
                SessionEntry {
                    session_id: "old".into(),
                    full_path: "/a".into(),
                    file_mtime: 10.0,
                },
                SessionEntry {
                    session_id: "new".into(),
                    full_path: "/b".into(),
                    file_mtime: 30.0,
                },
                SessionEntry {
                    session_id: "tie".into(),
                    full_path: "/c".into(),
                    file_mtime: 30.0,
                },
            ],
        };
        assert_eq!(index.newest().unwrap().session_id, "new");
        assert!(SessionsIndex::default().newest().is_none());
    }
}

#[cfg(test)]
mod store {
    use crate::{
        encode_project_path, ClaudeProjects, MissingReason, TranscriptLookup, TranscriptSource,
    };
    use std::path::Path;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ClaudeProjects, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let projects = dir.path().join("projects");
        let root = Path::new("/work/replication");
        let store = ClaudeProjects::new(&projects, root);
        let project_dir = projects.join("-work-replication");
        (dir, store, project_dir)
    }

    #[test]
    fn encodes_slashes_as_dashes() {
        assert_eq!(
            encode_project_path(Path::new("/home/me/proj")),
            "-home-me-proj"
        );
    }

    #[test]
    fn missing_project_dir() {
        let (_dir, store, _) = setup();
        assert!(matches!(
            store.latest().unwrap(),
            TranscriptLookup::Missing(MissingReason::ProjectDirNotFound(_))
        ));
    }

    #[test]
    fn missing_index() {
        let (_dir, store, project_dir) = setup();
        std::fs::create_dir_all(&project_dir).unwrap();
        assert_eq!(
            store.latest().unwrap(),
            TranscriptLookup::Missing(MissingReason::NoSessionIndex)
        );
    }

    #[test]
    fn empty_index() {
        let (_dir, store, project_dir) = setup();
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("sessions-index.json"), r#"{"entries":[]}"#).unwrap();
        assert_eq!(
            store.latest().unwrap(),
            TranscriptLookup::Missing(MissingReason::NoSessions)
        );
    }

    #[test]
    fn corrupt_index_is_an_error() {
        let (_dir, store, project_dir) = setup();
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("sessions-index.json"), "{not json").unwrap();
        assert!(store.latest().is_err());
    }

    #[test]
    fn loads_newest_session() {
        let (_dir, store, project_dir) = setup();
        std::fs::create_dir_all(&project_dir).unwrap();
        let old = project_dir.join("old.jsonl");
        let new = project_dir.join("new.jsonl");
        std::fs::write(&old, r#"{"type":"user","message":{"content":"old"}}"#).unwrap();
        std::fs::write(&new, r#"{"type":"user","message":{"content":"new"}}"#).unwrap();
        let index = serde_json::json!({
            "entries": [
                {"sessionId": "s-old", "fullPath": old, "fileMtime": 1},
                {"sessionId": "s-new", "fullPath": new, "fileMtime": 2},
            ]
        });
        std::fs::write(project_dir.join("sessions-index.json"), index.to_string()).unwrap();

        let TranscriptLookup::Found(t) = store.latest().unwrap() else {
            panic!("expected a transcript");
        };
        assert_eq!(t.session_id, "s-new");
        assert_eq!(t.messages.len(), 1);
        assert_eq!(t.messages[0].content, "new");
    }

    #[test]
    fn session_file_gone() {
        let (_dir, store, project_dir) = setup();
        std::fs::create_dir_all(&project_dir).unwrap();
        let index = serde_json::json!({
            "entries": [{"sessionId": "s", "fullPath": project_dir.join("gone.jsonl"), "fileMtime": 5}]
        });
        std::fs::write(project_dir.join("sessions-index.json"), index.to_string()).unwrap();
        assert!(matches!(
            store.latest().unwrap(),
            TranscriptLookup::Missing(MissingReason::SessionFileNotFound(_))
        ));
    }

    #[test]
    fn disabled_source_is_always_missing() {
        assert_eq!(
            crate::Disabled.latest().unwrap(),
            TranscriptLookup::Missing(MissingReason::Disabled)
        );
        assert_eq!(
            MissingReason::Disabled.to_string(),
            "Transcript capture is disabled."
        );
    }
}
