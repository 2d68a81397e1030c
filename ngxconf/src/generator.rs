//! Builds a complete nginx configuration from a [`Topology`]
//!
//! Output layout: a catch-all default server first, then for each
//! application an upstream pointing at its local runtime port followed by
//! a server with one access-restricted location per path.

use crate::topology::{App, PathRule, Topology};
use indexmap::IndexMap;
use ngxconf_core::{Conf, Container, Key, Node, Parent};
use thiserror::Error;

/// Host the upstreams forward to
pub const UPSTREAM_HOST: &str = "127.0.0.1";

/// Document root of the default server
pub const DEFAULT_ROOT: &str = "/var/www";

/// Catch-all identifier whose port the default server listens on
pub const DEFAULT_CATCH_ALL: &str = "default";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("app '{env}' refers to unknown catch-all '{id}'")]
    UnknownCatchAll { env: String, id: String },

    #[error("no 'default' catch-all configured")]
    NoDefaultCatchAll,
}

pub type Result<T> = std::result::Result<T, GenerateError>;

/// Configuration generator
///
/// Filter lists live on the instance, so two generators never see each
/// other's CIDRs.
pub struct Generator<'t> {
    topology: &'t Topology,
    filter_list: Vec<String>,
    allow_all_list: Vec<String>,
    catch_all_ports: IndexMap<String, u16>,
}

impl<'t> Generator<'t> {
    pub fn new(topology: &'t Topology) -> Self {
        Self {
            topology,
            filter_list: Vec::new(),
            allow_all_list: Vec::new(),
            catch_all_ports: IndexMap::new(),
        }
    }

    /// Collect the `myfilter` CIDRs, replacing any earlier collection
    pub fn build_ip_filters(&mut self) {
        self.filter_list = match self.topology.ipfilter.myfilter.as_deref() {
            Some(list) if !list.is_empty() => list.to_vec(),
            _ => {
                tracing::warn!(
                    "⚠️ myfilter is empty in the topology, no rules will be created for it"
                );
                Vec::new()
            }
        };
    }

    /// Collect the `allowall` CIDRs, replacing any earlier collection
    pub fn build_allow_all_ip_list(&mut self) {
        self.allow_all_list = match self.topology.ipfilter.allowall.as_deref() {
            Some(list) if !list.is_empty() => list.to_vec(),
            _ => {
                tracing::warn!(
                    "⚠️ allowall is empty in the topology, no rules will be created for it"
                );
                Vec::new()
            }
        };
    }

    /// Collect catch-all identifiers and their ports
    pub fn build_default_catch_all_map(&mut self) {
        self.catch_all_ports = self
            .topology
            .catchall
            .iter()
            .map(|(id, catch_all)| (id.clone(), catch_all.port))
            .collect();
    }

    /// `upstream <env> { server <host>:<port>; }`
    pub fn build_upstream(&self, env: &str, runtime_port: u16, host: &str) -> Container {
        tracing::info!("🔗 Building upstream for env: {}", env);
        Container::upstream(env)
            .with_children([Key::new("server", format!("{}:{}", host, runtime_port))])
    }

    /// Server block for one application
    pub fn build_server(
        &self,
        env: &str,
        server_names: &[String],
        paths: Option<&IndexMap<String, PathRule>>,
        catch_all_id: &str,
    ) -> Result<Container> {
        tracing::info!("🏗️ Building server for env: {}", env);
        let port = self
            .catch_all_ports
            .get(catch_all_id)
            .copied()
            .ok_or_else(|| GenerateError::UnknownCatchAll {
                env: env.to_string(),
                id: catch_all_id.to_string(),
            })?;

        let mut server = Container::server();

        if server_names.is_empty() {
            tracing::warn!("⚠️ Server names for env {} are not set", env);
        }
        server.add(server_names.iter().map(|name| Key::new("server_name", name.as_str())));
        server.add(listen_keys(port));

        match paths {
            Some(paths) if !paths.is_empty() => {
                for (path, rule) in paths {
                    let mut location = Container::location(path.as_str());
                    location.add([Key::new("proxy_pass", format!("http://{}", env))]);

                    let allowed: &[String] = match rule.ipfilter.as_deref() {
                        Some("myfilter") => &self.filter_list,
                        Some("allowall") => &self.allow_all_list,
                        Some(other) => {
                            tracing::warn!(
                                "⚠️ Unknown ipfilter '{}' for {} {}",
                                other,
                                env,
                                path
                            );
                            &[]
                        }
                        None => &[],
                    };
                    location.add(allowed.iter().map(|cidr| Key::new("allow", cidr.as_str())));
                    location.add([Key::new("deny", "all")]);

                    server.add([location]);
                }
            }
            _ => tracing::warn!("⚠️ No locations specified for env: {}", env),
        }

        Ok(server)
    }

    /// Catch-all server answering for unknown hosts
    ///
    /// Only the first entry of `paths` becomes a location; its map is
    /// written out as directives in order.
    pub fn build_default_server(
        &self,
        port: u16,
        root: &str,
        server_names: &[String],
        paths: &IndexMap<String, IndexMap<String, String>>,
    ) -> Container {
        let mut server = Container::server();
        server.add(listen_keys(port));
        server.add([Key::new("root", root)]);

        if server_names.is_empty() {
            server.add([Key::new("server_name", "_")]);
        } else {
            server.add(server_names.iter().map(|name| Key::new("server_name", name.as_str())));
        }

        if let Some((path, directives)) = paths.first() {
            let location = Container::location(path.as_str()).with_children(
                directives
                    .iter()
                    .map(|(name, value)| Key::new(name.as_str(), value.as_str())),
            );
            server.add([location]);
        }

        server
    }

    /// Build the whole configuration
    pub fn generate(&mut self) -> Result<Conf> {
        tracing::info!("🔍 Initializing IP filters");
        self.build_ip_filters();
        tracing::info!("🔍 Initializing allowed CIDR list");
        self.build_allow_all_ip_list();
        tracing::info!("🔍 Initializing catch-all configuration");
        self.build_default_catch_all_map();

        let port = self
            .catch_all_ports
            .get(DEFAULT_CATCH_ALL)
            .copied()
            .ok_or(GenerateError::NoDefaultCatchAll)?;
        tracing::info!(
            "🏗️ Building default server on port {} with root {}",
            port,
            DEFAULT_ROOT
        );

        let mut conf = Conf::new();
        conf.add([self.build_default_server(port, DEFAULT_ROOT, &[], &default_paths())]);

        for (env, app) in &self.topology.app {
            let nodes = self.build_app(env, app)?;
            conf.add(nodes);
        }

        tracing::info!("✅ Generated {} top-level blocks", conf.children().len());
        Ok(conf)
    }

    fn build_app(&self, env: &str, app: &App) -> Result<[Node; 2]> {
        let upstream = self.build_upstream(env, app.runtime_port, UPSTREAM_HOST);
        let server = self.build_server(
            env,
            app.fqdn.as_deref().unwrap_or_default(),
            app.path_based_access_restriction.as_ref(),
            &app.catchall,
        )?;
        Ok([upstream.into(), server.into()])
    }
}

/// `/ { return 503; }`
fn default_paths() -> IndexMap<String, IndexMap<String, String>> {
    let mut directives = IndexMap::new();
    directives.insert("return".to_string(), "503".to_string());

    let mut paths = IndexMap::new();
    paths.insert("/".to_string(), directives);
    paths
}

/// IPv6 and IPv4 default listeners on `port`
fn listen_keys(port: u16) -> [Key; 2] {
    [
        Key::new("listen", format!("[::]:{} default_server ipv6only=on", port)),
        Key::new("listen", format!("0.0.0.0:{} default_server", port)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngxconf_core::Render;

    const TOPOLOGY: &str = "
ipfilter:
  myfilter:
    - 10.0.0.0/8
  allowall:
    - 0.0.0.0/0
catchall:
  default:
    port: 8080
  internal:
    port: 8081
app:
  staging:
    runtime_port: 9001
    fqdn:
      - staging.example.com
    catchall: internal
    path_based_access_restriction:
      /:
        ipfilter: allowall
      /admin:
        ipfilter: myfilter
";

    fn topology() -> Topology {
        Topology::from_yaml(TOPOLOGY).unwrap()
    }

    #[test]
    fn test_upstream() {
        let topology = topology();
        let generator = Generator::new(&topology);
        assert_eq!(
            generator.build_upstream("staging", 9001, UPSTREAM_HOST).dumps(),
            "upstream staging {\n    server 127.0.0.1:9001;\n}\n\n"
        );
    }

    #[test]
    fn test_filter_lists_are_per_instance() {
        let topology = topology();
        let mut first = Generator::new(&topology);
        first.build_ip_filters();
        first.build_ip_filters();
        assert_eq!(first.filter_list, ["10.0.0.0/8"]);

        let mut second = Generator::new(&topology);
        second.build_ip_filters();
        assert_eq!(second.filter_list, ["10.0.0.0/8"]);
    }

    #[test]
    fn test_empty_filter_lists() {
        let topology = Topology::default();
        let mut generator = Generator::new(&topology);
        generator.build_ip_filters();
        generator.build_allow_all_ip_list();
        assert!(generator.filter_list.is_empty());
        assert!(generator.allow_all_list.is_empty());
    }

    #[test]
    fn test_server_locations() {
        let topology = topology();
        let mut generator = Generator::new(&topology);
        generator.build_ip_filters();
        generator.build_allow_all_ip_list();
        generator.build_default_catch_all_map();

        let app = &topology.app["staging"];
        let server = generator
            .build_server(
                "staging",
                app.fqdn.as_deref().unwrap(),
                app.path_based_access_restriction.as_ref(),
                &app.catchall,
            )
            .unwrap();

        let expected = "\
server {
    server_name staging.example.com;
    listen [::]:8081 default_server ipv6only=on;
    listen 0.0.0.0:8081 default_server;

    location / {
        proxy_pass http://staging;
        allow 0.0.0.0/0;
        deny all;
    }


    location /admin {
        proxy_pass http://staging;
        allow 10.0.0.0/8;
        deny all;
    }
}
";
        assert_eq!(Conf::new().with_children([server]).dumps(), expected);
    }

    #[test]
    fn test_unknown_catch_all() {
        let topology = topology();
        let mut generator = Generator::new(&topology);
        generator.build_default_catch_all_map();

        let err = generator.build_server("staging", &[], None, "missing").unwrap_err();
        assert!(matches!(err, GenerateError::UnknownCatchAll { ref id, .. } if id == "missing"));
    }

    #[test]
    fn test_default_server() {
        let topology = topology();
        let generator = Generator::new(&topology);
        let server = generator.build_default_server(8080, DEFAULT_ROOT, &[], &default_paths());

        let expected = "\
server {
    listen [::]:8080 default_server ipv6only=on;
    listen 0.0.0.0:8080 default_server;
    root /var/www;
    server_name _;

    location / {
        return 503;
    }
}
";
        assert_eq!(Conf::new().with_children([server]).dumps(), expected);
    }

    #[test]
    fn test_generate_order() {
        let topology = topology();
        let conf = Generator::new(&topology).generate().unwrap();

        let kinds: Vec<String> = conf
            .children()
            .iter()
            .map(|node| format!("{} {}", node.name(), node.value()))
            .collect();
        assert_eq!(kinds, ["server ", "upstream staging", "server "]);
        assert_eq!(conf.servers()[1].keys()[0].value, "staging.example.com");
    }

    #[test]
    fn test_generate_twice_is_stable() {
        let topology = topology();
        let mut generator = Generator::new(&topology);
        let first = generator.generate().unwrap().dumps();
        let second = generator.generate().unwrap().dumps();
        assert_eq!(first, second);
        assert_eq!(second.matches("allow 10.0.0.0/8;").count(), 1);
    }

    #[test]
    fn test_generate_without_default_catch_all() {
        let topology = Topology::from_yaml("catchall:\n  other:\n    port: 1\n").unwrap();
        let err = Generator::new(&topology).generate().unwrap_err();
        assert!(matches!(err, GenerateError::NoDefaultCatchAll));
    }
}
