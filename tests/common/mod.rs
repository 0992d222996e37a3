use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FixtureEnv {
    _temp: TempDir,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub seen_path: PathBuf,
    pub cache_path: PathBuf,
    pub snapshot_dir: PathBuf,
}

/// Builds a self-contained file-mode source: two listing pages and three
/// detail pages with deliberately different markup shapes, plus one
/// duplicate-title repost.
pub fn setup_fixture_env() -> anyhow::Result<FixtureEnv> {
    let temp = TempDir::new()?;
    let root = temp.path().to_path_buf();

    let config_dir = root.join("sources");
    let data_dir = root.join("data");
    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&data_dir)?;

    write(&config_dir.join("kstartup.toml"), SOURCE_CONFIG)?;
    write(&data_dir.join("list-1.html"), LIST_PAGE_1)?;
    write(&data_dir.join("list-2.html"), LIST_PAGE_2)?;
    write(&data_dir.join("detail-301.html"), DETAIL_301)?;
    write(&data_dir.join("detail-302.html"), DETAIL_302)?;
    write(&data_dir.join("detail-303.html"), DETAIL_303)?;
    // detail-304.html intentionally absent: the duplicate-title repost must
    // be dropped before any detail fetch happens.

    Ok(FixtureEnv {
        config_dir,
        data_dir,
        seen_path: root.join("state/seen.json"),
        cache_path: root.join("state/details.json"),
        snapshot_dir: root.join("snapshots"),
        _temp: temp,
    })
}

fn write(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

const SOURCE_CONFIG: &str = r#"
[source]
key = "kstartup"
name = "K-Startup 사업공고"

[fetch]
mode = "file"
page_files = ["../data/list-1.html", "../data/list-2.html"]

[pagination]
max_pages = 5

[selectors]
row = "tr.notice-row"
title = "td.subject a"
link = "td.subject a"
date = "td.date"

[identity]
patterns = ['detail-(\d+)\.html']
"#;

const LIST_PAGE_1: &str = r#"<!doctype html>
<html><body>
<table class="board"><tbody>
<tr class="notice-row">
  <td class="num">4</td>
  <td class="subject"><a href="detail-301.html">[서울] 청년창업 지원사업 공고</a></td>
  <td class="date">2026.03.02</td>
</tr>
<tr class="notice-row">
  <td class="num">3</td>
  <td class="subject"><a href="detail-302.html">[경기] 소상공인 판로개척 지원</a></td>
  <td class="date">2026.03.01</td>
</tr>
</tbody></table>
</body></html>
"#;

const LIST_PAGE_2: &str = r#"<!doctype html>
<html><body>
<table class="board"><tbody>
<tr class="notice-row">
  <td class="num">2</td>
  <td class="subject"><a href="detail-303.html">수출기업 글로벌 마케팅 지원</a></td>
  <td class="date">2026.03.05</td>
</tr>
<tr class="notice-row">
  <td class="num">1</td>
  <td class="subject"><a href="detail-304.html">[부산] 청년창업  지원사업 공고</a></td>
  <td class="date">2026.02.20</td>
</tr>
</tbody></table>
</body></html>
"#;

const DETAIL_301: &str = r#"<!doctype html>
<html><body>
<table class="view">
<tr><th>지원대상</th><td>청년 예비창업자</td></tr>
<tr><th>신청기간</th><td>2026.02.25 ~ 2026.03.24</td></tr>
<tr><th>지원금액</th><td>최대 1억원</td></tr>
</table>
<p>지원대상 관련 문의는 담당 기관으로 연락 바랍니다.</p>
<div class="view_cont">예비창업자의 사업화를 위한 자금과 교육 프로그램을 제공하는 공고입니다.</div>
</body></html>
"#;

const DETAIL_302: &str = r#"<!doctype html>
<html><body>
<dl>
<dt>지원대상</dt>
<dd>소상공인 및 소기업</dd>
</dl>
<table>
<tr><td>접수기간</td><td>2026.03.10 ~ 2026.04.10</td><td>지원규모</td><td>총 10억원</td></tr>
</table>
<div class="view_cont">판로개척을 위한 온라인 입점과 홍보비를 지원합니다.</div>
</body></html>
"#;

const DETAIL_303: &str = r#"<!doctype html>
<html><body>
<p>본문 준비중</p>
</body></html>
"#;
