//! Caveats as requested by a service, the capabilities that check them, and
//! a small vocabulary of first-party conditions.
//!
//! Checkers are plain capabilities: any `Fn(&str) -> Result<()>` is a
//! [FirstPartyChecker] and any `Fn(&[u8], &str) -> Result<Vec<Caveat>>` is a
//! [ThirdPartyChecker]. Conditions written with the helpers in this module
//! take the form `"<name> <argument>"` and can be checked by a [CheckerMap].

use anyhow::{anyhow, Result};
use instant::SystemTime;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display};

use crate::sync::ConditionalSync;

pub const COND_TIME_BEFORE: &str = "time-before";
pub const COND_ALLOW: &str = "allow";
pub const COND_DENY: &str = "deny";

/// A caveat that a service is asked to attach to a macaroon. An empty
/// location means the condition is checked by the target service itself;
/// otherwise the service at that location must discharge it.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct Caveat {
    #[serde(default)]
    pub location: String,
    pub condition: String,
}

impl Caveat {
    pub fn first_party(condition: &str) -> Self {
        Caveat {
            location: String::new(),
            condition: condition.to_owned(),
        }
    }

    pub fn third_party(location: &str, condition: &str) -> Self {
        Caveat {
            location: location.to_owned(),
            condition: condition.to_owned(),
        }
    }

    pub fn is_first_party(&self) -> bool {
        self.location.is_empty()
    }
}

/// Checks the conditions of first-party caveats at verification time
pub trait FirstPartyChecker: ConditionalSync {
    fn check_first_party_caveat(&self, condition: &str) -> Result<()>;
}

impl<F> FirstPartyChecker for F
where
    F: Fn(&str) -> Result<()> + ConditionalSync,
{
    fn check_first_party_caveat(&self, condition: &str) -> Result<()> {
        self(condition)
    }
}

/// Decides whether a third-party caveat holds when a discharge is requested.
/// On success it returns further caveats to attach to the discharge, which
/// may themselves need discharging.
pub trait ThirdPartyChecker: ConditionalSync {
    fn check_third_party_caveat(&self, caveat_id: &[u8], condition: &str) -> Result<Vec<Caveat>>;
}

impl<F> ThirdPartyChecker for F
where
    F: Fn(&[u8], &str) -> Result<Vec<Caveat>> + ConditionalSync,
{
    fn check_third_party_caveat(&self, caveat_id: &[u8], condition: &str) -> Result<Vec<Caveat>> {
        self(caveat_id, condition)
    }
}

/// Split a condition into its name and argument at the first space
pub fn parse_condition(condition: &str) -> (&str, &str) {
    match condition.split_once(' ') {
        Some((name, argument)) => (name, argument),
        None => (condition, ""),
    }
}

fn condition<A: Display>(name: &str, argument: A) -> Caveat {
    Caveat::first_party(&format!("{name} {argument}"))
}

/// A caveat that holds until the given POSIX timestamp (in seconds)
pub fn time_before_caveat(timestamp: u64) -> Caveat {
    condition(COND_TIME_BEFORE, timestamp)
}

/// A caveat that holds only for the listed operations
pub fn allow_caveat(operations: &[&str]) -> Caveat {
    condition(COND_ALLOW, operations.join(" "))
}

/// A caveat that holds for every operation except the listed ones
pub fn deny_caveat(operations: &[&str]) -> Caveat {
    condition(COND_DENY, operations.join(" "))
}

pub fn now() -> Result<u64> {
    Ok(SystemTime::UNIX_EPOCH
        .elapsed()
        .map_err(|_| anyhow!("Could not generate timestamp."))?
        .as_secs())
}

fn check_time_before(argument: &str) -> Result<()> {
    let deadline: u64 = argument
        .trim()
        .parse()
        .map_err(|_| anyhow!("cannot parse \"{}\" as a timestamp", argument))?;

    match now()? < deadline {
        true => Ok(()),
        false => Err(anyhow!("macaroon has expired")),
    }
}

type ConditionCheck = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;

/// A [FirstPartyChecker] that dispatches on the condition name. Conditions
/// with no registered check are rejected.
#[derive(Default)]
pub struct CheckerMap {
    checks: HashMap<String, ConditionCheck>,
}

impl CheckerMap {
    /// Check conditions named `name` by passing their argument to `check`
    pub fn with<F>(mut self, name: &str, check: F) -> Self
    where
        F: Fn(&str) -> Result<()> + Send + Sync + 'static,
    {
        self.checks.insert(name.to_owned(), Box::new(check));
        self
    }

    /// Accept `time-before` conditions whose deadline has not passed
    pub fn with_time_before(self) -> Self {
        self.with(COND_TIME_BEFORE, check_time_before)
    }

    /// Accept `allow` and `deny` conditions as they apply to `operation`
    pub fn with_operation(self, operation: &str) -> Self {
        let allowed = operation.to_owned();
        let denied = operation.to_owned();

        self.with(COND_ALLOW, move |argument| {
            match argument.split_whitespace().any(|listed| listed == allowed) {
                true => Ok(()),
                false => Err(anyhow!("{} not allowed", allowed)),
            }
        })
        .with(COND_DENY, move |argument| {
            match argument.split_whitespace().any(|listed| listed == denied) {
                true => Err(anyhow!("{} not allowed", denied)),
                false => Ok(()),
            }
        })
    }
}

impl FirstPartyChecker for CheckerMap {
    fn check_first_party_caveat(&self, condition: &str) -> Result<()> {
        let (name, argument) = parse_condition(condition);

        match self.checks.get(name) {
            Some(check) => check(argument)
                .map_err(|error| anyhow!("caveat \"{}\" not satisfied: {}", condition, error)),
            None => Err(anyhow!(
                "caveat \"{}\" not satisfied: caveat not recognized",
                condition
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        allow_caveat, deny_caveat, now, parse_condition, time_before_caveat, CheckerMap,
        FirstPartyChecker,
    };

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_test_configure!(run_in_browser);

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_splits_conditions_at_the_first_space() {
        assert_eq!(parse_condition("allow read write"), ("allow", "read write"));
        assert_eq!(parse_condition("something"), ("something", ""));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_checks_time_before_conditions() {
        let checker = CheckerMap::default().with_time_before();
        let later = time_before_caveat(now().unwrap() + 60);
        let earlier = time_before_caveat(now().unwrap() - 60);

        assert!(later.is_first_party());
        checker.check_first_party_caveat(&later.condition).unwrap();

        let error = checker
            .check_first_party_caveat(&earlier.condition)
            .unwrap_err();
        assert!(error.to_string().ends_with("macaroon has expired"));

        assert!(checker
            .check_first_party_caveat("time-before yesterday")
            .is_err());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_checks_operations_against_allow_and_deny() {
        let reading = CheckerMap::default().with_operation("read");

        reading
            .check_first_party_caveat(&allow_caveat(&["read", "write"]).condition)
            .unwrap();
        reading
            .check_first_party_caveat(&deny_caveat(&["delete"]).condition)
            .unwrap();

        assert!(reading
            .check_first_party_caveat(&allow_caveat(&["write"]).condition)
            .is_err());
        assert!(reading
            .check_first_party_caveat(&deny_caveat(&["read"]).condition)
            .is_err());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_rejects_conditions_it_does_not_know() {
        let checker = CheckerMap::default().with_time_before();

        let error = checker
            .check_first_party_caveat("user==bob")
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "caveat \"user==bob\" not satisfied: caveat not recognized"
        );
    }
}
