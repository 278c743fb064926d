//! The Compose file schema as static data.

use crate::schema::{SchemaNode, ValueType, WILDCARD};

use ValueType::{Array, Boolean, Null, Number, Object, String as Str};

pub const VERSIONS: &[&str] = &[
    "2", "2.0", "2.1", "2.2", "2.3", "2.4", "3", "3.0", "3.1", "3.2", "3.3", "3.4", "3.5", "3.6",
    "3.7", "3.8", "3.9",
];

const RESTART: &[&str] = &["no", "always", "on-failure", "unless-stopped"];
const PULL_POLICY: &[&str] = &["always", "never", "missing", "build", "if_not_present"];
const NETWORK_MODE: &[&str] = &[
    "bridge",
    "host",
    "none",
    "service:[service name]",
    "container:[container name/id]",
];
const IPC_MODE: &[&str] = &[
    "host",
    "private",
    "shareable",
    "service:[service name]",
    "container:[container name/id]",
];
const PID_MODE: &[&str] = &["host", "service:[service name]", "container:[container name/id]"];
const ISOLATION: &[&str] = &["default", "process", "hyperv"];
const CGROUP: &[&str] = &["host", "private"];
const DEPLOY_MODE: &[&str] = &["replicated", "global", "replicated-job", "global-job"];
const ENDPOINT_MODE: &[&str] = &["vip", "dnsrr"];
const RESTART_CONDITION: &[&str] = &["none", "on-failure", "any"];
const FAILURE_ACTION: &[&str] = &["continue", "rollback", "pause"];
const UPDATE_ORDER: &[&str] = &["stop-first", "start-first"];
const DEPENDS_CONDITION: &[&str] = &[
    "service_started",
    "service_healthy",
    "service_completed_successfully",
];
const LOG_DRIVERS: &[&str] = &[
    "json-file", "local", "syslog", "journald", "gelf", "fluentd", "awslogs", "splunk", "etwlogs",
    "gcplogs", "logentries", "none",
];
const NETWORK_DRIVERS: &[&str] = &["bridge", "overlay", "host", "none", "macvlan", "ipvlan"];

fn string(description: &'static str) -> SchemaNode {
    SchemaNode::leaf(&[Str], description)
}

fn number(description: &'static str) -> SchemaNode {
    SchemaNode::leaf(&[Number, Str], description)
}

fn boolean(description: &'static str) -> SchemaNode {
    SchemaNode::leaf(&[Boolean], description)
}

fn list(description: &'static str) -> SchemaNode {
    SchemaNode::leaf(&[Array], description)
}

fn string_or_list(description: &'static str) -> SchemaNode {
    SchemaNode::leaf(&[Str, Array], description)
}

fn choice(description: &'static str, values: &'static [&'static str]) -> SchemaNode {
    string(description).with_values(values)
}

/// Arbitrary user mapping (labels, driver options, ...); never checked.
fn free(description: &'static str) -> SchemaNode {
    SchemaNode::leaf(&[Object, Array], description).free_form()
}

fn object<I>(description: &'static str, children: I) -> SchemaNode
where
    I: IntoIterator<Item = (&'static str, SchemaNode)>,
{
    SchemaNode::container(&[Object], description, children)
}

/// A mapping from user-chosen names to entries shaped like `entry`.
fn named(description: &'static str, entry: SchemaNode) -> SchemaNode {
    SchemaNode::container(&[Object, Null], description, [(WILDCARD, entry)])
}

pub fn build() -> SchemaNode {
    object(
        "Compose file",
        [
            ("version", choice("Compose file format version (obsolete in the Compose Specification)", VERSIONS)),
            ("name", string("Project name")),
            ("services", named("Service definitions, keyed by service name", service())),
            ("networks", named("Networks, keyed by network name", network())),
            ("volumes", named("Named volumes, keyed by volume name", volume())),
            ("configs", named("Configs, keyed by config name", config())),
            ("secrets", named("Secrets, keyed by secret name", secret())),
            ("include", list("Other Compose files to include in this project")),
        ],
    )
    .with_extensions()
}

fn service() -> SchemaNode {
    object(
        "A service definition",
        [
            ("image", string("Image to start the container from")),
            ("build", build_config()),
            ("container_name", string("Custom container name")),
            ("command", string_or_list("Override the default command")),
            ("entrypoint", string_or_list("Override the default entrypoint")),
            ("environment", free("Environment variables, as a list or mapping")),
            ("env_file", string_or_list("Files to read environment variables from")),
            ("ports", list("Published ports (HOST:CONTAINER)")),
            ("expose", list("Ports exposed to linked services, not published to the host")),
            ("volumes", list("Mounted host paths or named volumes")),
            ("volumes_from", list("Mount all volumes from another service or container")),
            ("networks", service_networks()),
            ("network_mode", choice("Network mode", NETWORK_MODE)),
            ("depends_on", depends_on()),
            ("links", list("Links to containers in another service")),
            ("external_links", list("Links to containers started outside this project")),
            ("restart", choice("Restart policy applied on container exit", RESTART)),
            ("deploy", deploy()),
            ("healthcheck", healthcheck()),
            ("logging", logging()),
            ("labels", free("Metadata labels for the container")),
            ("annotations", free("Annotations for the container")),
            ("working_dir", string("Working directory inside the container")),
            ("user", string("User (and optionally group) to run as")),
            ("hostname", string("Container hostname")),
            ("domainname", string("Container domain name")),
            ("dns", string_or_list("Custom DNS servers")),
            ("dns_search", string_or_list("Custom DNS search domains")),
            ("extra_hosts", free("Additional hostname mappings")),
            ("cap_add", list("Kernel capabilities to add")),
            ("cap_drop", list("Kernel capabilities to drop")),
            ("privileged", boolean("Run the container in privileged mode")),
            ("read_only", boolean("Mount the root filesystem read-only")),
            ("stdin_open", boolean("Keep stdin open")),
            ("tty", boolean("Allocate a pseudo-TTY")),
            ("init", boolean("Run an init process inside the container")),
            ("stop_signal", string("Signal used to stop the container")),
            ("stop_grace_period", string("Time to wait before killing the container")),
            ("secrets", list("Secrets granted to the service")),
            ("configs", list("Configs granted to the service")),
            ("ulimits", free("Override default ulimits")),
            ("sysctls", free("Kernel parameters to set in the container")),
            ("tmpfs", string_or_list("Mount temporary filesystems")),
            ("devices", list("Device mappings")),
            ("platform", string("Target platform, e.g. linux/amd64")),
            ("pull_policy", choice("When to pull the image", PULL_POLICY)),
            ("profiles", list("Profiles this service is enabled under")),
            ("ipc", choice("IPC isolation mode", IPC_MODE)),
            ("pid", choice("PID mode", PID_MODE)),
            ("cgroup", choice("Cgroup namespace", CGROUP)),
            ("cgroup_parent", string("Parent cgroup")),
            ("shm_size", number("Size of /dev/shm")),
            ("security_opt", list("Security options")),
            ("userns_mode", string("User namespace mode")),
            ("isolation", choice("Container isolation technology", ISOLATION)),
            ("runtime", string("OCI runtime")),
            ("scale", number("Default number of containers")),
            ("mem_limit", number("Memory limit")),
            ("mem_reservation", number("Memory soft limit")),
            ("memswap_limit", number("Memory plus swap limit")),
            ("cpus", number("Number of CPUs")),
            ("cpu_shares", number("Relative CPU weight")),
            ("cpuset", string("CPUs in which to allow execution")),
            ("oom_score_adj", number("OOM preference")),
            ("extends", SchemaNode::leaf(&[Str, Object], "Share configuration with another service").free_form()),
            ("develop", free("Development (watch) configuration")),
        ],
    )
    .with_extensions()
}

fn build_config() -> SchemaNode {
    SchemaNode::container(
        &[Str, Object],
        "Build configuration: a context path or a detailed build section",
        [
            ("context", string("Path or URL of the build context")),
            ("dockerfile", string("Alternate Dockerfile")),
            ("dockerfile_inline", string("Inline Dockerfile content")),
            ("args", free("Build arguments")),
            ("target", string("Build stage to target")),
            ("cache_from", list("Cache sources")),
            ("cache_to", list("Cache export destinations")),
            ("labels", free("Image labels")),
            ("network", string("Network to use during build")),
            ("shm_size", number("Size of /dev/shm during build")),
            ("extra_hosts", free("Additional hostname mappings during build")),
            ("platforms", list("Target platforms")),
            ("secrets", list("Secrets exposed to the build")),
            ("ssh", string_or_list("SSH authentications for the build")),
            ("tags", list("Additional image tags")),
            ("no_cache", boolean("Disable the build cache")),
            ("pull", boolean("Always pull referenced images")),
            ("additional_contexts", free("Named additional build contexts")),
        ],
    )
}

fn service_networks() -> SchemaNode {
    SchemaNode::container(
        &[Array, Object],
        "Networks the service attaches to",
        [(
            WILDCARD,
            SchemaNode::container(
                &[Object, Null],
                "Attachment to a network",
                [
                    ("aliases", list("Alternative hostnames on this network")),
                    ("ipv4_address", string("Static IPv4 address")),
                    ("ipv6_address", string("Static IPv6 address")),
                    ("link_local_ips", list("Link-local IPs")),
                    ("mac_address", string("MAC address on this network")),
                    ("priority", number("Connection priority")),
                ],
            ),
        )],
    )
}

fn depends_on() -> SchemaNode {
    SchemaNode::container(
        &[Array, Object],
        "Startup and shutdown dependencies between services",
        [(
            WILDCARD,
            object(
                "Dependency on another service",
                [
                    ("condition", choice("Condition to wait for", DEPENDS_CONDITION)),
                    ("restart", boolean("Restart this service when the dependency is updated")),
                    ("required", boolean("Fail if the dependency is not started")),
                ],
            ),
        )],
    )
}

fn deploy() -> SchemaNode {
    object(
        "Deployment and lifecycle configuration",
        [
            ("mode", choice("Replication model", DEPLOY_MODE)),
            ("replicas", number("Number of containers to run")),
            (
                "placement",
                object(
                    "Placement constraints and preferences",
                    [
                        ("constraints", list("Placement constraints")),
                        ("preferences", list("Placement preferences")),
                        ("max_replicas_per_node", number("Maximum replicas per node")),
                    ],
                ),
            ),
            (
                "resources",
                object(
                    "Resource constraints",
                    [("limits", limits("Hard resource limits")), ("reservations", limits("Guaranteed resources"))],
                ),
            ),
            (
                "restart_policy",
                object(
                    "How to restart containers when they exit",
                    [
                        ("condition", choice("When to restart", RESTART_CONDITION)),
                        ("delay", string("Time between restart attempts")),
                        ("max_attempts", number("Maximum restart attempts")),
                        ("window", string("Time to wait before deciding a restart succeeded")),
                    ],
                ),
            ),
            ("update_config", update_config("How the service is updated")),
            ("rollback_config", update_config("How the service is rolled back")),
            ("endpoint_mode", choice("Service discovery method", ENDPOINT_MODE)),
            ("labels", free("Labels on the service")),
        ],
    )
}

fn limits(description: &'static str) -> SchemaNode {
    object(
        description,
        [
            ("cpus", number("CPU share")),
            ("memory", number("Memory amount")),
            ("pids", number("Maximum number of processes")),
            ("devices", list("Device reservations")),
            ("generic_resources", list("Generic resources")),
        ],
    )
}

fn update_config(description: &'static str) -> SchemaNode {
    object(
        description,
        [
            ("parallelism", number("Containers updated at a time")),
            ("delay", string("Time between updating groups")),
            ("failure_action", choice("What to do when an update fails", FAILURE_ACTION)),
            ("monitor", string("Time to monitor each task for failure")),
            ("max_failure_ratio", number("Tolerated failure rate")),
            ("order", choice("Order of operations", UPDATE_ORDER)),
        ],
    )
}

fn healthcheck() -> SchemaNode {
    object(
        "Container health check",
        [
            ("test", string_or_list("Command run to check health")),
            ("interval", string("Time between checks")),
            ("timeout", string("Time after which a check is considered failed")),
            ("retries", number("Consecutive failures needed to be unhealthy")),
            ("start_period", string("Initialization grace period")),
            ("start_interval", string("Time between checks during the start period")),
            ("disable", boolean("Disable the image's health check")),
        ],
    )
}

fn logging() -> SchemaNode {
    object(
        "Logging configuration",
        [
            ("driver", choice("Logging driver", LOG_DRIVERS)),
            ("options", free("Driver-specific options")),
        ],
    )
}

fn network() -> SchemaNode {
    object(
        "A network definition",
        [
            ("driver", choice("Network driver", NETWORK_DRIVERS)),
            ("driver_opts", free("Driver-specific options")),
            ("attachable", boolean("Allow standalone containers to attach")),
            ("enable_ipv6", boolean("Enable IPv6")),
            ("ipam", free("IP address management configuration")),
            ("internal", boolean("Create an externally isolated network")),
            ("labels", free("Network labels")),
            ("external", boolean("Network is managed outside this project")),
            ("name", string("Actual network name")),
        ],
    )
    .with_extensions()
}

fn volume() -> SchemaNode {
    object(
        "A named volume definition",
        [
            ("driver", string("Volume driver")),
            ("driver_opts", free("Driver-specific options")),
            ("external", boolean("Volume is managed outside this project")),
            ("labels", free("Volume labels")),
            ("name", string("Actual volume name")),
        ],
    )
    .with_extensions()
}

fn config() -> SchemaNode {
    object(
        "A config definition",
        [
            ("file", string("File the config is read from")),
            ("environment", string("Environment variable the config is read from")),
            ("content", string("Inline config content")),
            ("external", boolean("Config is managed outside this project")),
            ("name", string("Actual config name")),
            ("labels", free("Config labels")),
            ("template_driver", string("Templating driver")),
        ],
    )
    .with_extensions()
}

fn secret() -> SchemaNode {
    object(
        "A secret definition",
        [
            ("file", string("File the secret is read from")),
            ("environment", string("Environment variable the secret is read from")),
            ("external", boolean("Secret is managed outside this project")),
            ("name", string("Actual secret name")),
            ("labels", free("Secret labels")),
            ("template_driver", string("Templating driver")),
        ],
    )
    .with_extensions()
}
