#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{schema::Schema, RefOr};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let schema = components.schemas.get(name).unwrap();
        if let RefOr::T(Schema::Object(obj)) = schema {
            obj.properties.keys().cloned().collect()
        } else {
            panic!("{name} should be an object schema");
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();
        for name in ["ErrorResponse", "HealthResponse", "RunForecastRequest", "FigureDto", "SummaryRow"] {
            assert!(components.schemas.contains_key(name), "missing schema {name}");
        }

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_paths_are_documented() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;
        for path in [
            "/health",
            "/api/v1/models",
            "/api/v1/template",
            "/api/v1/sessions",
            "/api/v1/sessions/{id}",
            "/api/v1/sessions/{id}/dataset",
            "/api/v1/sessions/{id}/upload",
            "/api/v1/sessions/{id}/selection",
            "/api/v1/sessions/{id}/visualization",
            "/api/v1/sessions/{id}/summary",
            "/api/v1/sessions/{id}/summary/plot",
            "/api/v1/sessions/{id}/summary/download",
            "/api/v1/sessions/{id}/forecast",
            "/api/v1/sessions/{id}/forecast/plot",
            "/api/v1/sessions/{id}/forecast/metrics",
        ] {
            assert!(paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for field in ["error", "code", "success"] {
            assert!(properties.contains(&field.to_string()));
        }
    }

    #[test]
    fn test_summary_row_uses_percentile_names() {
        let properties = object_properties("SummaryRow");
        for field in ["variable", "count", "25%", "50%", "75%", "skew", "kurtosis"] {
            assert!(properties.contains(&field.to_string()), "missing {field}");
        }
    }

    #[test]
    fn test_run_forecast_request_structure() {
        let properties = object_properties("RunForecastRequest");
        for field in ["model", "horizon", "time_column", "target_column"] {
            assert!(properties.contains(&field.to_string()));
        }
    }
}
