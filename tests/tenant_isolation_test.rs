// ABOUTME: Integration tests for per-request tenant isolation
// ABOUTME: Concurrent tenants never see each other's rows and every statement binds the tenant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use common::{components, create_test_gateway, test_config, HeaderResolver, ORG_HEADER};
use cube_gateway::engine::SqlQueryEngine;
use cube_gateway::server::GatewayServer;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

async fn employee_names(router: Router, organisation: &str) -> BTreeSet<String> {
    let response = AxumTestRequest::post("/cubejs-api/v1/load")
        .header(ORG_HEADER, organisation)
        .json(&json!({
            "query": {
                "measures": ["Employees.count"],
                "dimensions": ["Employees.name"]
            }
        }))
        .send(router)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["Employees.name"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tenants_see_only_their_rows() {
    let gateway = create_test_gateway().unwrap();
    let first: BTreeSet<String> = ["Alice", "Bob", "Carol"].map(str::to_owned).into();
    let second: BTreeSet<String> = ["Dmitri", "Eve"].map(str::to_owned).into();

    let mut handles = Vec::new();
    for i in 0..20 {
        let router = gateway.router.clone();
        let organisation = if i % 2 == 0 { "1" } else { "2" };
        handles.push(tokio::spawn(async move {
            (organisation, employee_names(router, organisation).await)
        }));
    }

    for handle in handles {
        let (organisation, names) = handle.await.unwrap();
        match organisation {
            "1" => assert_eq!(names, first),
            _ => assert_eq!(names, second),
        }
    }

    assert_eq!(gateway.resolver.calls(), 20);
    assert_eq!(gateway.engine.loads(), 20);
}

#[tokio::test]
async fn test_generated_sql_binds_the_callers_organisation() {
    let server = GatewayServer::build(
        test_config(),
        components(
            Arc::new(SqlQueryEngine::new()),
            Arc::new(HeaderResolver::default()),
        ),
    )
    .unwrap();

    for organisation in [1_i64, 2] {
        let response = AxumTestRequest::post("/cubejs-api/v1/sql")
            .header(ORG_HEADER, &organisation.to_string())
            .json(&json!({
                "query": {
                    "measures": ["Employees.count"],
                    "dimensions": ["Departments.name"],
                    "filters": [
                        {"member": "Departments.name", "operator": "equals", "values": ["Platform"]}
                    ]
                }
            }))
            .send(server.router())
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: Value = response.json();
        let sql = body["sql"]["sql"].as_str().unwrap();
        assert!(sql.contains("WHERE \"Employees\".\"organisation_id\" = $1"));
        assert!(sql.contains("AND \"Departments\".\"organisation_id\" = $1"));
        assert_eq!(body["sql"]["params"], json!([organisation, "Platform"]));
    }
}
