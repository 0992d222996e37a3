//! Rule-based title classification. Every function here is pure, total and
//! deterministic: keyword tables only, no external calls, always a value.

/// Fallback for both region functions when nothing in the title narrows
/// the audience down.
pub const NATIONWIDE: &str = "전국";

const PROVINCES: &[&str] = &[
    "서울", "부산", "대구", "인천", "광주", "대전", "울산", "세종", "경기", "강원", "충북",
    "충남", "전북", "전남", "경북", "경남", "제주",
];

/// City/district keywords mapped onto the fixed administrative regions.
/// Ordered; the first region whose keyword appears in the title wins.
const REGION_CATEGORIES: &[(&str, &[&str])] = &[
    ("서울", &["서울", "강남", "강북", "송파", "마포", "관악", "영등포", "구로"]),
    (
        "경기",
        &[
            "경기", "수원", "성남", "부천", "고양", "용인", "안산", "안양", "평택", "화성",
            "파주", "김포", "시흥",
        ],
    ),
    ("인천", &["인천"]),
    ("부산", &["부산"]),
    ("대구", &["대구"]),
    ("광주", &["광주"]),
    ("대전", &["대전"]),
    ("울산", &["울산"]),
    ("세종", &["세종"]),
    ("강원", &["강원", "춘천", "원주", "강릉"]),
    ("충청", &["충북", "충남", "청주", "천안", "충주", "아산"]),
    ("전라", &["전북", "전남", "전주", "목포", "여수", "군산", "익산"]),
    (
        "경상",
        &["경북", "경남", "포항", "구미", "창원", "김해", "진주", "경주"],
    ),
    ("제주", &["제주"]),
];

/// Topical keyword groups, ordered by priority; the first group with a
/// keyword in the title wins.
const CATEGORY_GROUPS: &[(&str, &[&str])] = &[
    ("교육", &["교육", "아카데미", "캠퍼스", "특강", "연수", "스쿨", "강좌"]),
    ("컨설팅·멘토링", &["컨설팅", "멘토링", "자문", "코칭", "진단"]),
    ("글로벌·수출", &["글로벌", "수출", "해외", "무역", "바이어", "현지화"]),
    ("시설·공간", &["시설", "공간", "입주", "보육", "임대", "오피스"]),
    (
        "자금·금융",
        &["자금", "융자", "보조금", "펀드", "투자", "금융", "대출", "출연금"],
    ),
    (
        "판로·마케팅",
        &["마케팅", "판로", "홍보", "판촉", "전시회", "박람회", "유통"],
    ),
];

/// Topical fallback when no keyword group matches.
pub const DEFAULT_CATEGORY: &str = "사업화";

const TARGET_KEYWORDS: &[&str] = &[
    "청년",
    "소상공인",
    "1인",
    "예비창업",
    "예비 창업",
    "초기창업",
    "초기 창업",
    "창업 3년",
    "스타트업",
    "소기업",
];

/// Region marker for display: a leading bracketed tag if the source put
/// one there, else the first province name in the title, else nationwide.
pub fn region_tag(title: &str) -> String {
    let trimmed = title.trim();
    if let Some(rest) = trimmed.strip_prefix('[')
        && let Some(end) = rest.find(']')
    {
        let tag = rest[..end].trim();
        if !tag.is_empty() {
            return tag.to_string();
        }
    }

    for province in PROVINCES {
        if trimmed.contains(province) {
            return (*province).to_string();
        }
    }

    NATIONWIDE.to_string()
}

/// Administrative region bucket for grouping.
pub fn region_category(title: &str) -> String {
    for (region, keywords) in REGION_CATEGORIES {
        if keywords.iter().any(|kw| title.contains(kw)) {
            return (*region).to_string();
        }
    }
    NATIONWIDE.to_string()
}

/// Topical category; total over every possible title.
pub fn category(title: &str) -> String {
    for (name, keywords) in CATEGORY_GROUPS {
        if keywords.iter().any(|kw| title.contains(kw)) {
            return (*name).to_string();
        }
    }
    DEFAULT_CATEGORY.to_string()
}

/// True when the title addresses youth, small-business, solo-founder or
/// early-stage-company audiences.
pub fn is_target(title: &str) -> bool {
    TARGET_KEYWORDS.iter().any(|kw| title.contains(kw))
}
