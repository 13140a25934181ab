use super::*;

// =========================================================
// 辅助函数
// =========================================================

fn redirect_to(target: &str) -> Resolution {
    Resolution::Redirect(target.to_string())
}

// =========================================================
// 规范路径
// =========================================================

#[test]
fn test_canonical_paths_render() {
    let cases = [
        ("/", Page::Swap),
        ("/tokens", Page::Tokens),
        ("/pools", Page::Pools),
        (
            "/pools/add-liquidity/0xabc",
            Page::AddLiquidity {
                pool_id: "0xabc".to_string(),
            },
        ),
        ("/portfolio", Page::Portfolio),
        ("/portfolio/rewards/claim", Page::RewardsClaim),
        (
            "/portfolio/rewards/stake/7",
            Page::RewardsStake {
                pool_id: "7".to_string(),
            },
        ),
        ("/vote", Page::Vote),
        ("/fiat", Page::Fiat),
    ];

    for (path, page) in cases {
        assert_eq!(resolve(path, ""), Resolution::Render(page.clone()), "{}", path);
        // 页面的规范路径应能解析回自身
        assert_eq!(page.to_path(), path);
    }
}

// =========================================================
// 旧路径重定向
// =========================================================

#[test]
fn test_legacy_paths_redirect() {
    let cases = [
        ("/eth/swap", "/"),
        ("/eth/data", "/pools"),
        ("/eth/portfolio/stake/add/single/5", "/pools/add-liquidity/5"),
        ("/eth/pool/add/42", "/pools/add-liquidity/42"),
        ("/eth/portfolio", "/portfolio"),
        ("/eth/portfolio/stake/rewards/withdraw", "/portfolio/rewards/claim"),
        ("/eth/portfolio/stake/rewards/restake/9", "/portfolio/rewards/stake/9"),
        ("/eth/vote", "/vote"),
        ("/eth/fiat", "/fiat"),
    ];

    for (legacy, canonical) in cases {
        assert_eq!(resolve(legacy, ""), redirect_to(canonical), "{}", legacy);
    }
}

#[test]
fn test_legacy_pool_add_redirects() {
    assert_eq!(
        resolve_url("/eth/pool/add/42"),
        redirect_to("/pools/add-liquidity/42")
    );
}

#[test]
fn test_parameter_substituted_verbatim() {
    let id = "0x1F573D6Fb3F13d689FF844B4cE37794d79a7FF1C";
    assert_eq!(
        resolve(&format!("/eth/portfolio/stake/rewards/restake/{}", id), ""),
        redirect_to(&format!("/portfolio/rewards/stake/{}", id))
    );
}

#[test]
fn test_legacy_root_forwards_query() {
    let search = "?from=0xeth&to=0xbnt&amount=1.5";
    assert_eq!(
        resolve("/eth/swap", search),
        redirect_to("/?from=0xeth&to=0xbnt&amount=1.5")
    );
    assert_eq!(
        resolve_url("/eth/swap?from=0xeth&to=0xbnt"),
        redirect_to("/?from=0xeth&to=0xbnt")
    );
    // 不带 `?` 的输入也能正确拼接
    assert_eq!(resolve("/eth/swap", "a=1"), redirect_to("/?a=1"));
}

#[test]
fn test_other_legacy_paths_drop_query() {
    assert_eq!(resolve("/eth/vote", "?x=1"), redirect_to("/vote"));
    assert_eq!(
        resolve("/eth/pool/add/3", "?x=1"),
        redirect_to("/pools/add-liquidity/3")
    );
}

// =========================================================
// 严格匹配与 404
// =========================================================

#[test]
fn test_unknown_path_not_found() {
    assert_eq!(resolve("/unknown/page", ""), Resolution::NotFound);
    assert_eq!(resolve("", ""), Resolution::NotFound);
    assert_eq!(resolve("pools", ""), Resolution::NotFound);
}

#[test]
fn test_strict_trailing_slash() {
    assert_eq!(resolve("/pools/", ""), Resolution::NotFound);
    assert_eq!(resolve("/eth/vote/", ""), Resolution::NotFound);
    assert_eq!(resolve("//", ""), Resolution::NotFound);
}

#[test]
fn test_exact_segments() {
    // 部分分段与多余分段都不算命中
    assert_eq!(resolve("/pool", ""), Resolution::NotFound);
    assert_eq!(resolve("/poolsx", ""), Resolution::NotFound);
    assert_eq!(resolve("/pools/add-liquidity", ""), Resolution::NotFound);
    assert_eq!(resolve("/pools/add-liquidity/", ""), Resolution::NotFound);
    assert_eq!(resolve("/pools/add-liquidity/1/2", ""), Resolution::NotFound);
    assert_eq!(resolve("/eth/pool/add/", ""), Resolution::NotFound);
}

#[test]
fn test_split_url() {
    assert_eq!(split_url("/pools?x=1#top"), ("/pools", "?x=1"));
    assert_eq!(split_url("/pools#top"), ("/pools", ""));
    assert_eq!(split_url("/"), ("/", ""));
}

// =========================================================
// settle
// =========================================================

#[test]
fn test_settle_follows_redirect() {
    let settled = settle("/eth/swap?from=a");
    assert_eq!(settled.url, "/?from=a");
    assert_eq!(settled.path(), "/");
    assert_eq!(settled.page, Some(Page::Swap));
    assert!(settled.redirected);
}

#[test]
fn test_settle_canonical() {
    let settled = settle("/fiat");
    assert_eq!(settled.url, "/fiat");
    assert_eq!(settled.page, Some(Page::Fiat));
    assert!(!settled.redirected);
}

#[test]
fn test_settle_not_found() {
    let settled = settle("/unknown/page");
    assert_eq!(settled.url, "/unknown/page");
    assert_eq!(settled.page, None);
    assert!(!settled.redirected);
}

#[test]
fn test_table_has_no_redirect_loops() {
    // 每个重定向目标都必须直接落在可渲染的规范路径上
    for entry in ROUTE_TABLE {
        if let RouteAction::Redirect { to, .. } = entry.action {
            let concrete = to.replace(":id", "1");
            assert!(
                matches!(resolve(&concrete, ""), Resolution::Render(_)),
                "{} -> {}",
                entry.pattern,
                to
            );
        }
    }
}
