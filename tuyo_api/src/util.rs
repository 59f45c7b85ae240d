/// Join a base URL and path segments with exactly one `/` between them.
pub fn build_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for seg in segments {
        url.push('/');
        url.push_str(seg.trim_start_matches('/'));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::build_url;

    #[test]
    fn joins_without_doubled_slashes() {
        assert_eq!(
            build_url("http://localhost:8080/", &["tarjetas", "/crearTarjeta", "17"]),
            "http://localhost:8080/tarjetas/crearTarjeta/17"
        );
    }
}
