//! Property key catalog and canonical key ordering.
//!
//! These tables are process-wide and read-only. Sorted rendering places keys
//! in the order the Nagios object definition documentation lists them for
//! each kind; keys a kind's table does not know are left out of sorted
//! output.

use crate::kind::ObjectKind;

/// Separator between a check command and its arguments.
pub const COMMAND_SEPARATOR: &str = "!";

/// Separator between members of list-valued properties.
pub const LIST_SEPARATOR: &str = ",";

/// Every property key the catalog knows, in byte order.
pub const PROPERTY_KEYS: &[&str] = &[
    "2d_coords",
    "3d_coords",
    "action_url",
    "active_checks_enabled",
    "address",
    "addressx",
    "alias",
    "can_submit_commands",
    "check_command",
    "check_freshness",
    "check_interval",
    "check_period",
    "command_line",
    "command_name",
    "contact_groups",
    "contact_name",
    "contactgroup_members",
    "contactgroup_name",
    "contactgroups",
    "contacts",
    "dependency_period",
    "dependent_host_name",
    "dependent_hostgroup_name",
    "dependent_service_description",
    "dependent_servicegroup_name",
    "display_name",
    "email",
    "escalation_options",
    "escalation_period",
    "event_handler",
    "event_handler_enabled",
    "exclude",
    "execution_failure_criteria",
    "first_notification",
    "first_notification_delay",
    "flap_detection_enabled",
    "flap_detection_options",
    "freshness_threshold",
    "friday",
    "high_flap_threshold",
    "host_name",
    "host_notification_commands",
    "host_notification_options",
    "host_notification_period",
    "host_notifications_enabled",
    "hostgroup_members",
    "hostgroup_name",
    "hostgroups",
    "icon_image",
    "icon_image_alt",
    "inherits_parent",
    "initial_state",
    "is_volatile",
    "last_notification",
    "low_flap_threshold",
    "max_check_attempts",
    "members",
    "monday",
    "name",
    "notes",
    "notes_url",
    "notification_failure_criteria",
    "notification_interval",
    "notification_options",
    "notification_period",
    "notifications_enabled",
    "obsess_over_host",
    "obsess_over_service",
    "pager",
    "parents",
    "passive_checks_enabled",
    "process_perf_data",
    "register",
    "retain_nonstatus_information",
    "retain_status_information",
    "retry_interval",
    "saturday",
    "service_description",
    "service_notification_commands",
    "service_notification_options",
    "service_notification_period",
    "service_notifications_enabled",
    "servicegroup_members",
    "servicegroup_name",
    "servicegroups",
    "stalking_options",
    "statusmap_image",
    "sunday",
    "thursday",
    "timeperiod_name",
    "tuesday",
    "use",
    "vrml_image",
    "wednesday",
];

/// Template keys that lead every sorted object, whatever its kind.
const TEMPLATE_KEYS: &[&str] = &["name", "use", "register"];

const COMMAND_KEYS: &[&str] = &["command_name", "command_line"];

const CONTACT_KEYS: &[&str] = &[
    "contact_name",
    "alias",
    "contactgroups",
    "host_notifications_enabled",
    "service_notifications_enabled",
    "host_notification_period",
    "service_notification_period",
    "host_notification_options",
    "service_notification_options",
    "host_notification_commands",
    "service_notification_commands",
    "email",
    "pager",
    "addressx",
    "can_submit_commands",
    "retain_status_information",
    "retain_nonstatus_information",
];

const CONTACTGROUP_KEYS: &[&str] = &[
    "contactgroup_name",
    "alias",
    "members",
    "contactgroup_members",
];

const HOST_KEYS: &[&str] = &[
    "host_name",
    "alias",
    "display_name",
    "address",
    "parents",
    "hostgroups",
    "check_command",
    "initial_state",
    "max_check_attempts",
    "check_interval",
    "retry_interval",
    "active_checks_enabled",
    "passive_checks_enabled",
    "check_period",
    "obsess_over_host",
    "check_freshness",
    "freshness_threshold",
    "event_handler",
    "event_handler_enabled",
    "low_flap_threshold",
    "high_flap_threshold",
    "flap_detection_enabled",
    "flap_detection_options",
    "process_perf_data",
    "retain_status_information",
    "retain_nonstatus_information",
    "contacts",
    "contact_groups",
    "notification_interval",
    "first_notification_delay",
    "notification_period",
    "notification_options",
    "notifications_enabled",
    "stalking_options",
    "notes",
    "notes_url",
    "action_url",
    "icon_image",
    "icon_image_alt",
    "vrml_image",
    "statusmap_image",
    "2d_coords",
    "3d_coords",
];

const HOSTDEPENDENCY_KEYS: &[&str] = &[
    "dependent_host_name",
    "dependent_hostgroup_name",
    "host_name",
    "hostgroup_name",
    "inherits_parent",
    "execution_failure_criteria",
    "notification_failure_criteria",
    "dependency_period",
];

const HOSTESCALATION_KEYS: &[&str] = &[
    "host_name",
    "hostgroup_name",
    "contacts",
    "contact_groups",
    "first_notification",
    "last_notification",
    "notification_interval",
    "escalation_period",
    "escalation_options",
];

const HOSTEXTINFO_KEYS: &[&str] = &[
    "host_name",
    "notes",
    "notes_url",
    "action_url",
    "icon_image",
    "icon_image_alt",
    "vrml_image",
    "statusmap_image",
    "2d_coords",
    "3d_coords",
];

const HOSTGROUP_KEYS: &[&str] = &[
    "hostgroup_name",
    "alias",
    "members",
    "hostgroup_members",
    "notes",
    "notes_url",
    "action_url",
];

const SERVICE_KEYS: &[&str] = &[
    "host_name",
    "hostgroup_name",
    "service_description",
    "display_name",
    "servicegroups",
    "is_volatile",
    "check_command",
    "initial_state",
    "max_check_attempts",
    "check_interval",
    "retry_interval",
    "active_checks_enabled",
    "passive_checks_enabled",
    "check_period",
    "obsess_over_service",
    "check_freshness",
    "freshness_threshold",
    "event_handler",
    "event_handler_enabled",
    "low_flap_threshold",
    "high_flap_threshold",
    "flap_detection_enabled",
    "flap_detection_options",
    "process_perf_data",
    "retain_status_information",
    "retain_nonstatus_information",
    "notification_interval",
    "first_notification_delay",
    "notification_period",
    "notification_options",
    "notifications_enabled",
    "contacts",
    "contact_groups",
    "stalking_options",
    "notes",
    "notes_url",
    "action_url",
    "icon_image",
    "icon_image_alt",
];

const SERVICEDEPENDENCY_KEYS: &[&str] = &[
    "dependent_host_name",
    "dependent_hostgroup_name",
    "dependent_service_description",
    "dependent_servicegroup_name",
    "host_name",
    "hostgroup_name",
    "service_description",
    "inherits_parent",
    "execution_failure_criteria",
    "notification_failure_criteria",
    "dependency_period",
];

const SERVICEESCALATION_KEYS: &[&str] = &[
    "host_name",
    "hostgroup_name",
    "service_description",
    "contacts",
    "contact_groups",
    "first_notification",
    "last_notification",
    "notification_interval",
    "escalation_period",
    "escalation_options",
];

const SERVICEEXTINFO_KEYS: &[&str] = &[
    "host_name",
    "service_description",
    "notes",
    "notes_url",
    "action_url",
    "icon_image",
    "icon_image_alt",
];

const SERVICEGROUP_KEYS: &[&str] = &[
    "servicegroup_name",
    "alias",
    "members",
    "servicegroup_members",
    "notes",
    "notes_url",
    "action_url",
];

const TIMEPERIOD_KEYS: &[&str] = &[
    "timeperiod_name",
    "alias",
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "exclude",
];

/// Canonical key order for a kind, excluding the template keys.
#[must_use]
pub const fn keys_for(kind: ObjectKind) -> &'static [&'static str] {
    match kind {
        ObjectKind::Command => COMMAND_KEYS,
        ObjectKind::Contact => CONTACT_KEYS,
        ObjectKind::ContactGroup => CONTACTGROUP_KEYS,
        ObjectKind::Host => HOST_KEYS,
        ObjectKind::HostDependency => HOSTDEPENDENCY_KEYS,
        ObjectKind::HostEscalation => HOSTESCALATION_KEYS,
        ObjectKind::HostExtInfo => HOSTEXTINFO_KEYS,
        ObjectKind::HostGroup => HOSTGROUP_KEYS,
        ObjectKind::Service => SERVICE_KEYS,
        ObjectKind::ServiceDependency => SERVICEDEPENDENCY_KEYS,
        ObjectKind::ServiceEscalation => SERVICEESCALATION_KEYS,
        ObjectKind::ServiceExtInfo => SERVICEEXTINFO_KEYS,
        ObjectKind::ServiceGroup => SERVICEGROUP_KEYS,
        ObjectKind::TimePeriod => TIMEPERIOD_KEYS,
    }
}

/// Sort priority of `key` for `kind`; lower sorts first.
///
/// Returns `None` for keys that have no place in the kind's table.
#[must_use]
pub fn priority(kind: ObjectKind, key: &str) -> Option<usize> {
    if let Some(pos) = TEMPLATE_KEYS.iter().position(|k| *k == key) {
        return Some(pos);
    }
    keys_for(kind)
        .iter()
        .position(|k| *k == key)
        .map(|pos| pos + TEMPLATE_KEYS.len())
}

/// Returns true if `key` appears in the catalog.
#[must_use]
pub fn is_known_key(key: &str) -> bool {
    PROPERTY_KEYS.binary_search(&key).is_ok()
}
