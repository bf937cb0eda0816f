use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "requests",
    metric_type: MetricType::Counter,
    description: "Number of drain requests handled. Tagged with drain, status.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with drain.",
};

pub const RECORDS_SUBMITTED: MetricDef = MetricDef {
    name: "records.submitted",
    metric_type: MetricType::Counter,
    description: "Number of log records accepted by the sink. Tagged with drain.",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUESTS, REQUEST_DURATION, RECORDS_SUBMITTED];
