//! The renderMap tool and the map app resource.

use mcp::{
    ArgumentSchema, CallToolResult, FieldKind, FieldSpec, FileAsset, RESOURCE_MIME_TYPE,
    ResourceDescriptor, Server, ToolArguments, ToolDescriptor,
};
use uuid::Uuid;

use crate::config::Config;

pub const RESOURCE_URI: &str = "ui://gmp-map/mcp-app.html";
pub const TOOL_NAME: &str = "renderMap";

/// File name of the built app inside the asset directory.
const DOCUMENT: &str = "mcp-app.html";

/// Build a fresh server for one session.
pub fn create_server(config: &Config) -> mcp::Result<Server> {
    let mut server = Server::new(&config.server.name, &config.server.version);

    server.register_resource(
        ResourceDescriptor::new(RESOURCE_URI, RESOURCE_MIME_TYPE)
            .with_name(RESOURCE_URI)
            .with_description("Interactive Google Map view")
            .with_policy(config.csp.clone()),
        FileAsset::new(config.server.asset_dir.join(DOCUMENT)),
    )?;

    server.register_tool(
        ToolDescriptor::new(TOOL_NAME, render_map_schema())
            .with_title("Render Map")
            .with_description("Display an interactive Google Map at a specific location.")
            .with_resource(RESOURCE_URI),
        render_map,
    )?;

    Ok(server)
}

pub fn render_map_schema() -> ArgumentSchema {
    ArgumentSchema::new()
        .field(
            FieldSpec::new("lat", FieldKind::number_in(-90.0, 90.0))
                .describe("Latitude (-90 to 90)"),
        )
        .field(
            FieldSpec::new("lng", FieldKind::number_in(-180.0, 180.0))
                .describe("Longitude (-180 to 180)"),
        )
        .field(FieldSpec::new("zoom", FieldKind::number_in(0.0, 21.0)).describe("Zoom level (0-21)"))
}

fn render_map(args: &ToolArguments) -> mcp::Result<CallToolResult> {
    let lat = args.require_number("lat")?;
    let lng = args.require_number("lng")?;
    let zoom = args.require_number("zoom")?;

    let view_uuid = Uuid::new_v4();
    tracing::debug!(lat, lng, zoom, %view_uuid, "rendering map");

    Ok(CallToolResult::text(format!(
        "Displaying Google Map at: Lat:{lat:.4}, Lng:{lng:.4}, Zoom:{zoom}"
    ))
    .with_meta("viewUUID", view_uuid.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp::{Error, RESOURCE_URI_META_KEY};
    use serde_json::json;
    use std::collections::HashSet;

    fn config_with_assets(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.server.asset_dir = dir.to_path_buf();
        config
    }

    fn view_uuid(result: &CallToolResult) -> String {
        result.meta_value("viewUUID").unwrap().as_str().unwrap().to_string()
    }

    #[test]
    fn render_map_formats_values() {
        let server = create_server(&Config::default()).unwrap();
        let result = server
            .call_tool(TOOL_NAME, Some(&json!({"lat": 47, "lng": -122.33, "zoom": 10})))
            .unwrap();

        assert_eq!(result.content.len(), 1);
        assert_eq!(
            result.content[0].as_text(),
            Some("Displaying Google Map at: Lat:47.0000, Lng:-122.3300, Zoom:10")
        );
        assert!(!view_uuid(&result).is_empty());
    }

    #[test]
    fn view_uuid_is_unique_per_call() {
        let server = create_server(&Config::default()).unwrap();
        let args = json!({"lat": 0, "lng": 0, "zoom": 0});

        let uuids: HashSet<String> = (0..50)
            .map(|_| view_uuid(&server.call_tool(TOOL_NAME, Some(&args)).unwrap()))
            .collect();
        assert_eq!(uuids.len(), 50);
    }

    #[test]
    fn boundary_values_are_accepted() {
        let server = create_server(&Config::default()).unwrap();
        for args in [
            json!({"lat": -90, "lng": -180, "zoom": 0}),
            json!({"lat": 90, "lng": 180, "zoom": 21}),
            json!({"lat": 12.5, "lng": 99.25, "zoom": 7.5}),
        ] {
            let result = server.call_tool(TOOL_NAME, Some(&args)).unwrap();
            assert!(result.meta_value("viewUUID").is_some());
        }
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        let server = create_server(&Config::default()).unwrap();

        let err = server
            .call_tool(TOOL_NAME, Some(&json!({"lat": 200, "lng": 0, "zoom": 3})))
            .unwrap_err();
        match err {
            Error::Validation(e) => assert_eq!(e.field_names(), vec!["lat"]),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = server
            .call_tool(TOOL_NAME, Some(&json!({"lat": 1, "lng": 2})))
            .unwrap_err();
        match err {
            Error::Validation(e) => assert_eq!(e.field_names(), vec!["zoom"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn tool_points_at_resource() {
        let server = create_server(&Config::default()).unwrap();
        let tools = server.tools().list();
        assert_eq!(tools.len(), 1);

        let tool = &tools[0];
        assert_eq!(tool.name, TOOL_NAME);
        assert_eq!(tool.title.as_deref(), Some("Render Map"));
        assert_eq!(tool.meta.as_ref().unwrap()[RESOURCE_URI_META_KEY], RESOURCE_URI);
        assert_eq!(tool.input_schema["required"], json!(["lat", "lng", "zoom"]));
    }

    #[test]
    fn each_session_gets_its_own_server() {
        let config = Config::default();
        let first = create_server(&config).unwrap();
        let second = create_server(&config).unwrap();
        assert_eq!(first.tools().len(), 1);
        assert_eq!(second.tools().len(), 1);
    }

    #[tokio::test]
    async fn resource_serves_asset_with_csp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DOCUMENT), "<div id=\"map\"></div>").unwrap();
        let server = create_server(&config_with_assets(dir.path())).unwrap();

        let first = server.read_resource(RESOURCE_URI).await.unwrap();
        let second = server.read_resource(RESOURCE_URI).await.unwrap();
        assert_eq!(first, second);

        let contents = &first.contents[0];
        assert_eq!(contents.mime_type, RESOURCE_MIME_TYPE);
        assert_eq!(contents.text, "<div id=\"map\"></div>");
        let csp = &contents.meta.as_ref().unwrap()["ui"]["csp"];
        assert_eq!(csp["resourceDomains"][6], "https://*.ggpht.com");
    }

    #[tokio::test]
    async fn missing_asset_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_server(&config_with_assets(dir.path())).unwrap();
        let err = server.read_resource(RESOURCE_URI).await.unwrap_err();
        assert!(matches!(err, Error::ResourceRead { .. }));
    }
}
