//! Purpose: Track live engine sessions by name.
//! Exports: `Registry`, `validate_session_name`.
//! Role: Name-to-session resolution for callers that juggle several plots;
//! one options set governs every spawn.
//! Invariants: Session names are `[A-Za-z0-9_-]+`, never paths.
//! Invariants: `open` spawns at most one process per name.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::warn;

use crate::api::session::{Session, SessionExit, SessionOptions};
use crate::core::error::{Error, ErrorKind};

pub fn validate_session_name(name: &str) -> Result<(), Error> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if !valid {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid session name {name:?}"))
            .with_hint("Session names are letters, digits, underscores, and dashes."));
    }
    Ok(())
}

pub struct Registry {
    options: SessionOptions,
    sessions: HashMap<String, Session>,
}

impl Registry {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            sessions: HashMap::new(),
        }
    }

    /// The session for `name`, spawning the engine on first use.
    pub fn open(&mut self, name: &str) -> Result<&mut Session, Error> {
        validate_session_name(name)?;
        match self.sessions.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let session = Session::spawn(name, &self.options)?;
                Ok(entry.insert(session))
            }
        }
    }

    pub fn get(&mut self, name: &str) -> Result<&mut Session, Error> {
        self.sessions.get_mut(name).ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message(format!("no session named {name:?}"))
                .with_hint("Open it first; sessions live only as long as this process.")
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sessions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sessions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn close(&mut self, name: &str) -> Result<SessionExit, Error> {
        let session = self.sessions.remove(name).ok_or_else(|| {
            Error::new(ErrorKind::NotFound).with_message(format!("no session named {name:?}"))
        })?;
        session.close()
    }

    /// Close everything, tracing failures instead of failing the caller.
    pub fn close_all(&mut self) {
        for (name, session) in self.sessions.drain() {
            if let Err(err) = session.close() {
                warn!(session = %name, error = %err, "session close failed");
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(SessionOptions::new())
    }
}

#[cfg(test)]
mod tests {
    use super::{Registry, validate_session_name};
    use crate::core::error::ErrorKind;

    #[test]
    fn session_names_are_validated() {
        assert!(validate_session_name("main").is_ok());
        assert!(validate_session_name("fig-2_b").is_ok());
        for bad in ["", "a/b", "a b", "a.b"] {
            let err = validate_session_name(bad).expect_err("invalid");
            assert_eq!(err.kind(), ErrorKind::Usage);
        }
    }

    #[test]
    fn get_without_open_is_not_found() {
        let mut registry = Registry::default();
        let err = registry.get("ghost").expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[cfg(unix)]
    mod with_cat {
        use super::super::Registry;
        use crate::api::session::SessionOptions;

        fn cat_registry() -> Registry {
            Registry::new(SessionOptions::new().with_program("cat"))
        }

        #[test]
        fn open_reuses_the_live_session() {
            let mut registry = cat_registry();
            let pid = registry.open("main").expect("open").pid();
            assert_eq!(registry.open("main").expect("reopen").pid(), pid);
            assert_eq!(registry.names(), vec!["main"]);
            registry.close_all();
        }

        #[test]
        fn close_returns_the_exit_state() {
            let mut registry = cat_registry();
            registry.open("main").expect("open");
            let exit = registry.close("main").expect("close");
            assert!(exit.status.success());
            assert!(!registry.contains("main"));
        }
    }
}
