#[derive(clap::Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
/// Async ingress controller.
///
/// Rewrites Knative ingresses annotated with `async.knative.dev/mode`
/// so that requests can be handed over to the async producer.
pub struct AsyncIngressArgs {
    /// Ingress class of the generated ingresses.
    ///
    /// Unknown classes fall back to Kourier.
    #[arg(long, env = "INGRESS_CLASS_NAME")]
    pub ingress_class_name: Option<String>,

    /// Ingress class handled by this controller.
    #[arg(
        long,
        env = "ASYNC_INGRESS_CLASS",
        default_value = "async.ingress.networking.knative.dev"
    )]
    pub async_ingress_class: String,

    /// Namespace where the async producer runs.
    #[arg(long, env = "SYSTEM_NAMESPACE", default_value = "knative-serving")]
    pub system_namespace: String,

    /// Suffix of cluster-internal service hostnames.
    #[arg(long, env = "CLUSTER_DOMAIN", default_value = "cluster.local")]
    pub cluster_domain: String,

    /// Log level for the controller.
    #[arg(long, env = "ASYNC_INGRESS_LOG_LEVEL", default_value_t = tracing::level_filters::LevelFilter::INFO)]
    pub log_level: tracing::level_filters::LevelFilter,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::AsyncIngressArgs;

    #[test]
    fn every_argument_has_help() {
        let command = AsyncIngressArgs::command();
        command.clone().debug_assert();
        for arg in command.get_arguments() {
            let id = arg.get_id().as_str();
            if id == "help" || id == "version" {
                continue;
            }
            assert!(arg.get_help().is_some(), "--{id} has no help text");
        }
        let cluster_domain = command
            .get_arguments()
            .find(|arg| arg.get_id() == "cluster_domain")
            .unwrap();
        assert!(
            cluster_domain
                .get_help()
                .unwrap()
                .to_string()
                .contains("cluster-internal service hostnames")
        );
    }
}
