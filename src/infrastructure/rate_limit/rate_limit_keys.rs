pub fn user_key(user_id: &str) -> String {
    format!("user:{}", user_id)
}

pub fn anonymous_key(client: &str) -> String {
    format!("anon:{}", client)
}
