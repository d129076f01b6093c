//! Member-name conversion for expanded handler arguments.

use std::sync::LazyLock;

use regex::Regex;

static FIRST_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid pattern"));
static END_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid pattern"));
static PLURAL_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{2,}s$").expect("valid pattern"));

/// Convert a CamelCase member name to snake_case the way botocore does.
///
/// Names that already contain `_` are returned unchanged. A trailing plural
/// acronym (`ENIs`) stays a single word.
///
/// ```
/// use ruststack_aws_skeleton::xform_name;
///
/// assert_eq!(xform_name("QueueUrl"), "queue_url");
/// assert_eq!(xform_name("MD5OfMessageBody"), "md5_of_message_body");
/// assert_eq!(xform_name("QueueOwnerAWSAccountId"), "queue_owner_aws_account_id");
/// ```
#[must_use]
pub fn xform_name(name: &str) -> String {
    if name.contains('_') {
        return name.to_owned();
    }
    let name = match PLURAL_ACRONYM.find(name) {
        Some(m) => format!("{}_{}", &name[..m.start()], m.as_str().to_lowercase()),
        None => name.to_owned(),
    };
    let name = FIRST_CAP.replace_all(&name, "${1}_${2}");
    END_CAP.replace_all(&name, "${1}_${2}").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_snake_case_member_names() {
        assert_eq!(xform_name("QueueUrl"), "queue_url");
        assert_eq!(xform_name("DelaySeconds"), "delay_seconds");
        assert_eq!(xform_name("MessageBody"), "message_body");
        assert_eq!(xform_name("Action"), "action");
    }

    #[test]
    fn test_should_keep_acronyms_together() {
        assert_eq!(xform_name("MD5OfMessageBody"), "md5_of_message_body");
        assert_eq!(xform_name("AWSAccountIds"), "aws_account_ids");
        assert_eq!(
            xform_name("QueueOwnerAWSAccountId"),
            "queue_owner_aws_account_id"
        );
        assert_eq!(xform_name("DescribeENIs"), "describe_enis");
    }

    #[test]
    fn test_should_leave_snake_case_untouched() {
        assert_eq!(xform_name("already_snake"), "already_snake");
    }
}
