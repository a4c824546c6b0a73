//! Client configuration.

use std::time::Duration;

/// Query client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Path to the `kubectl` executable.
    pub kubectl_path: String,

    /// Arguments placed before every subcommand (e.g. `--context=staging`).
    pub global_args: Vec<String>,

    /// Namespace the query resources live in.
    pub namespace: String,

    /// Upper bound for a single `kubectl` invocation.
    pub command_timeout: Duration,

    /// Delay between two phase reads.
    pub poll_interval: Duration,

    /// Default overall wait for a query to finish.
    pub deadline: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            kubectl_path: "kubectl".to_string(),
            global_args: Vec::new(),
            namespace: "default".to_string(),
            command_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
            deadline: Duration::from_secs(300),
        }
    }
}

impl ClientConfig {
    /// Set the `kubectl` executable.
    pub fn with_kubectl_path(mut self, path: impl Into<String>) -> Self {
        self.kubectl_path = path.into();
        self
    }

    /// Add an argument placed before every subcommand.
    pub fn with_global_arg(mut self, arg: impl Into<String>) -> Self {
        self.global_args.push(arg.into());
        self
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the per-command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the default overall deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}
