//! Trimmed botocore models for tests.
//!
//! Each fixture keeps the real shape names, traits, and error metadata of a
//! handful of operations so the codecs are exercised against what SDKs send.

use std::sync::Arc;

use crate::service::ServiceModel;

/// SQS `2012-11-05`, query protocol.
pub const SQS_JSON: &str = include_str!("../fixtures/sqs-2012-11-05.json");
/// EC2 `2016-11-15`, ec2 protocol.
pub const EC2_JSON: &str = include_str!("../fixtures/ec2-2016-11-15.json");
/// Kinesis `2013-12-02`, json protocol.
pub const KINESIS_JSON: &str = include_str!("../fixtures/kinesis-2013-12-02.json");
/// S3 `2006-03-01`, rest-xml protocol without error wrapping.
pub const S3_JSON: &str = include_str!("../fixtures/s3-2006-03-01.json");
/// Route 53 `2013-04-01`, rest-xml protocol.
pub const ROUTE53_JSON: &str = include_str!("../fixtures/route53-2013-04-01.json");
/// Lambda `2015-03-31`, rest-json protocol.
pub const LAMBDA_JSON: &str = include_str!("../fixtures/lambda-2015-03-31.json");

fn load(service: &str, json: &str) -> Arc<ServiceModel> {
    match ServiceModel::from_slice(json.as_bytes()) {
        Ok(model) => Arc::new(model.with_service_name(service)),
        Err(e) => panic!("fixture model {service} is invalid: {e}"),
    }
}

/// The SQS fixture.
#[must_use]
pub fn sqs() -> Arc<ServiceModel> {
    load("sqs", SQS_JSON)
}

/// The EC2 fixture.
#[must_use]
pub fn ec2() -> Arc<ServiceModel> {
    load("ec2", EC2_JSON)
}

/// The Kinesis fixture.
#[must_use]
pub fn kinesis() -> Arc<ServiceModel> {
    load("kinesis", KINESIS_JSON)
}

/// The S3 fixture.
#[must_use]
pub fn s3() -> Arc<ServiceModel> {
    load("s3", S3_JSON)
}

/// The Route 53 fixture.
#[must_use]
pub fn route53() -> Arc<ServiceModel> {
    load("route53", ROUTE53_JSON)
}

/// The Lambda fixture.
#[must_use]
pub fn lambda() -> Arc<ServiceModel> {
    load("lambda", LAMBDA_JSON)
}
