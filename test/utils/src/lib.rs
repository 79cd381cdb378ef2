use serde_json::json;

pub fn created_task_body(task_id: &str) -> String {
    return json!({
        "task_id": task_id,
        "endpoint": format!("/run-task/{task_id}"),
    })
    .to_string();
}

pub fn validation_error_body(messages: &[&str]) -> String {
    let detail = messages
        .iter()
        .map(|msg| {
            return json!({
                "loc": ["body", "url"],
                "msg": msg,
                "type": "value_error",
            });
        })
        .collect::<Vec<_>>();

    return json!({ "detail": detail }).to_string();
}

pub fn server_error_body(message: &str) -> String {
    return json!({ "detail": { "error": message } }).to_string();
}

pub fn scrape_result_fixture() -> serde_json::Value {
    return json!({
        "task_id": "t1",
        "status": "completed",
        "result": {
            "products": [
                { "name": "Oat Bar", "price": "2.50" },
                { "name": "Granola", "price": "6.00" }
            ]
        }
    });
}
