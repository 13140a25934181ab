//! 路由定义模块 - 领域模型
//!
//! 纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 路由表按声明顺序匹配，第一个命中的条目决定结果：渲染页面、重定向或 404。
//! 匹配为精确分段匹配（exact + strict）：末尾斜杠、部分分段均不算命中。

use std::fmt::Display;

/// 重定向链的最大跟随次数
pub const MAX_REDIRECTS: usize = 4;

/// 应用页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// 兑换（首页）
    Swap,
    Tokens,
    Pools,
    AddLiquidity { pool_id: String },
    Portfolio,
    RewardsClaim,
    RewardsStake { pool_id: String },
    Vote,
    Fiat,
}

impl Page {
    /// 获取页面的规范路径
    pub fn to_path(&self) -> String {
        match self {
            Page::Swap => "/".to_string(),
            Page::Tokens => "/tokens".to_string(),
            Page::Pools => "/pools".to_string(),
            Page::AddLiquidity { pool_id } => format!("/pools/add-liquidity/{}", pool_id),
            Page::Portfolio => "/portfolio".to_string(),
            Page::RewardsClaim => "/portfolio/rewards/claim".to_string(),
            Page::RewardsStake { pool_id } => format!("/portfolio/rewards/stake/{}", pool_id),
            Page::Vote => "/vote".to_string(),
            Page::Fiat => "/fiat".to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Swap => "Swap",
            Page::Tokens => "Tokens",
            Page::Pools => "Pools",
            Page::AddLiquidity { .. } => "Add Liquidity",
            Page::Portfolio => "Portfolio",
            Page::RewardsClaim => "Claim Rewards",
            Page::RewardsStake { .. } => "Stake Rewards",
            Page::Vote => "Vote",
            Page::Fiat => "Buy Crypto",
        }
    }
}

impl Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

// =========================================================
// 路由表 (Route Table)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageKind {
    Swap,
    Tokens,
    Pools,
    AddLiquidity,
    Portfolio,
    RewardsClaim,
    RewardsStake,
    Vote,
    Fiat,
}

impl PageKind {
    fn build(self, params: &RouteParams<'_>) -> Option<Page> {
        let page = match self {
            PageKind::Swap => Page::Swap,
            PageKind::Tokens => Page::Tokens,
            PageKind::Pools => Page::Pools,
            PageKind::AddLiquidity => Page::AddLiquidity {
                pool_id: params.get("id")?.to_string(),
            },
            PageKind::Portfolio => Page::Portfolio,
            PageKind::RewardsClaim => Page::RewardsClaim,
            PageKind::RewardsStake => Page::RewardsStake {
                pool_id: params.get("id")?.to_string(),
            },
            PageKind::Vote => Page::Vote,
            PageKind::Fiat => Page::Fiat,
        };
        Some(page)
    }
}

#[derive(Debug, Clone, Copy)]
enum RouteAction {
    Render(PageKind),
    /// `to` 为目标模板，`:name` 分段会被替换为捕获到的同名参数
    Redirect {
        to: &'static str,
        forward_query: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct RouteEntry {
    pattern: &'static str,
    action: RouteAction,
}

const fn render(pattern: &'static str, kind: PageKind) -> RouteEntry {
    RouteEntry {
        pattern,
        action: RouteAction::Render(kind),
    }
}

const fn redirect(pattern: &'static str, to: &'static str) -> RouteEntry {
    RouteEntry {
        pattern,
        action: RouteAction::Redirect {
            to,
            forward_query: false,
        },
    }
}

const ROUTE_TABLE: &[RouteEntry] = &[
    render("/", PageKind::Swap),
    RouteEntry {
        pattern: "/eth/swap",
        action: RouteAction::Redirect {
            to: "/",
            forward_query: true,
        },
    },
    render("/tokens", PageKind::Tokens),
    render("/pools", PageKind::Pools),
    redirect("/eth/data", "/pools"),
    render("/pools/add-liquidity/:id", PageKind::AddLiquidity),
    redirect("/eth/portfolio/stake/add/single/:id", "/pools/add-liquidity/:id"),
    redirect("/eth/pool/add/:id", "/pools/add-liquidity/:id"),
    render("/portfolio", PageKind::Portfolio),
    redirect("/eth/portfolio", "/portfolio"),
    render("/portfolio/rewards/claim", PageKind::RewardsClaim),
    redirect("/eth/portfolio/stake/rewards/withdraw", "/portfolio/rewards/claim"),
    render("/portfolio/rewards/stake/:id", PageKind::RewardsStake),
    redirect(
        "/eth/portfolio/stake/rewards/restake/:id",
        "/portfolio/rewards/stake/:id",
    ),
    render("/vote", PageKind::Vote),
    redirect("/eth/vote", "/vote"),
    render("/fiat", PageKind::Fiat),
    redirect("/eth/fiat", "/fiat"),
];

// =========================================================
// 匹配 (Matching)
// =========================================================

/// 从路径中捕获的参数
#[derive(Debug, Default)]
struct RouteParams<'a> {
    values: Vec<(&'static str, &'a str)>,
}

impl<'a> RouteParams<'a> {
    fn get(&self, name: &str) -> Option<&'a str> {
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

/// 精确分段匹配
///
/// 两边按 `/` 切分后分段数必须相同，静态分段必须完全相等，
/// 参数分段（`:name`）匹配任意非空分段。
fn match_pattern<'a>(pattern: &'static str, path: &'a str) -> Option<RouteParams<'a>> {
    if !path.starts_with('/') {
        return None;
    }

    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    let mut params = RouteParams::default();

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(params),
            (Some(expected), Some(actual)) => {
                if let Some(name) = expected.strip_prefix(':') {
                    if actual.is_empty() {
                        return None;
                    }
                    params.values.push((name, actual));
                } else if expected != actual {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

/// 将捕获的参数代入目标模板
fn fill_template(template: &str, params: &RouteParams<'_>) -> Option<String> {
    let segments = template
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => params.get(name),
            None => Some(segment),
        })
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

fn normalize_search(search: &str) -> String {
    if search.is_empty() || search == "?" {
        String::new()
    } else if search.starts_with('?') {
        search.to_string()
    } else {
        format!("?{}", search)
    }
}

// =========================================================
// 解析 (Resolution)
// =========================================================

/// 单次解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Page),
    /// 重定向到新的 URL（路径 + 可选查询串）
    Redirect(String),
    NotFound,
}

/// 将 URL path 与查询串解析为路由结果
///
/// `search` 为 `location.search` 形式（带或不带 `?` 均可）。
pub fn resolve(path: &str, search: &str) -> Resolution {
    for entry in ROUTE_TABLE {
        let Some(params) = match_pattern(entry.pattern, path) else {
            continue;
        };

        return match entry.action {
            RouteAction::Render(kind) => kind
                .build(&params)
                .map(Resolution::Render)
                .unwrap_or(Resolution::NotFound),
            RouteAction::Redirect { to, forward_query } => {
                let Some(mut target) = fill_template(to, &params) else {
                    return Resolution::NotFound;
                };
                if forward_query {
                    target.push_str(&normalize_search(search));
                }
                Resolution::Redirect(target)
            }
        };
    }
    Resolution::NotFound
}

/// 拆分 URL 为 (path, search)，丢弃 `#` 片段
pub fn split_url(url: &str) -> (&str, &str) {
    let url = url.split('#').next().unwrap_or_default();
    match url.find('?') {
        Some(idx) => (&url[..idx], &url[idx..]),
        None => (url, ""),
    }
}

pub fn resolve_url(url: &str) -> Resolution {
    let (path, search) = split_url(url);
    resolve(path, search)
}

/// 跟随重定向后的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    /// 最终 URL（重定向后为目标 URL）
    pub url: String,
    /// 需要渲染的页面，None 表示 404
    pub page: Option<Page>,
    /// 是否经过了重定向
    pub redirected: bool,
}

impl Settled {
    /// 最终 URL 的 path 部分
    pub fn path(&self) -> &str {
        split_url(&self.url).0
    }
}

/// 解析 URL 并跟随重定向，最多 `MAX_REDIRECTS` 次
pub fn settle(url: &str) -> Settled {
    let mut current = url.to_string();
    let mut redirected = false;

    for _ in 0..=MAX_REDIRECTS {
        match resolve_url(&current) {
            Resolution::Render(page) => {
                return Settled {
                    url: current,
                    page: Some(page),
                    redirected,
                };
            }
            Resolution::Redirect(next) => {
                log::debug!("[Router] {} -> {}", current, next);
                current = next;
                redirected = true;
            }
            Resolution::NotFound => break,
        }
    }

    Settled {
        url: current,
        page: None,
        redirected,
    }
}

#[cfg(test)]
mod tests;
