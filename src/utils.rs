/// Path processing utility functions / 路径处理工具函数

/// Clean and normalize an object location / 清理和规范化对象路径
/// 1. Replace backslashes with forward slashes / 将反斜杠替换为正斜杠
/// 2. Strip leading and trailing slashes / 去掉首尾斜杠
/// 3. Clean . and .. in path / 清理路径中的 . 和 ..
pub fn clean_location(location: &str) -> String {
    let location = location.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();

    for part in location.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    parts.join("/")
}

/// Join a container name and an object location into a hosting path
/// ("container/dir/file.txt") / 拼接容器名与对象路径
pub fn join_hosting_path(container: &str, location: &str) -> String {
    let container = container.trim_matches('/');
    let location = clean_location(location);

    if location.is_empty() {
        container.to_string()
    } else {
        format!("{}/{}", container, location)
    }
}

/// Percent-encode each path segment, keeping the separators / 按段编码路径
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
