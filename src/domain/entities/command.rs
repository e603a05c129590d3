use serde::{Deserialize, Serialize};

use super::GuildId;

/// Type of value a command parameter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    String,
    User,
    Integer,
    Boolean,
}

impl ParameterKind {
    pub fn as_str(&self) -> &str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::User => "user",
            ParameterKind::Integer => "integer",
            ParameterKind::Boolean => "boolean",
        }
    }
}

/// A typed parameter of a slash command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandParameter {
    pub name: String,
    pub description: String,
    pub kind: ParameterKind,
    pub required: bool,
}

impl CommandParameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            required: true,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::String)
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::User)
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Declaration of a slash command as published to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub parameters: Vec<CommandParameter>,
}

impl Command {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<CommandParameter>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&CommandParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// The complete command surface of one guild, published as a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildCommandSet {
    pub guild_id: GuildId,
    pub commands: Vec<Command>,
}

impl GuildCommandSet {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            commands: Vec::new(),
        }
    }

    /// Exact, case-sensitive lookup by command name
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_exact() {
        let mut set = GuildCommandSet::new(GuildId(1));
        set.commands.push(Command::new(
            "invite",
            "Create an invitation",
            vec![CommandParameter::string("full_name")],
        ));

        assert!(set.contains("invite"));
        assert!(!set.contains("Invite"));
        assert!(!set.contains("inv"));
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["invite"]);
    }

    #[test]
    fn test_parameter_builder() {
        let param = CommandParameter::user("person")
            .with_description("Who to vouch for")
            .optional();
        assert_eq!(param.kind, ParameterKind::User);
        assert!(!param.required);
        assert_eq!(param.description, "Who to vouch for");
    }
}
