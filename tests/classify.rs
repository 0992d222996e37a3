use gonggo::classify::{DEFAULT_CATEGORY, NATIONWIDE, category, is_target, region_category, region_tag};

#[test]
fn region_tag_prefers_a_leading_bracket() {
    assert_eq!(region_tag("[서울] 청년창업 지원사업"), "서울");
    assert_eq!(region_tag("[강원특별자치도] 창업 아카데미"), "강원특별자치도");
    // An empty bracket is ignored.
    assert_eq!(region_tag("[] 창업 지원사업"), NATIONWIDE);
}

#[test]
fn region_tag_falls_back_to_a_province_in_the_title() {
    assert_eq!(region_tag("부산 소상공인 지원사업"), "부산");
    assert_eq!(region_tag("충남 해외진출 지원"), "충남");
    assert_eq!(region_tag("중소기업 수출 지원사업"), NATIONWIDE);
}

#[test]
fn region_category_buckets_cities_into_regions() {
    assert_eq!(region_category("수원 창업공간 입주기업 모집"), "경기");
    assert_eq!(region_category("[전주] 소상공인 판로 지원"), "전라");
    assert_eq!(region_category("창원 스마트공장 보급사업"), "경상");
    assert_eq!(region_category("전국 단위 창업경진대회"), NATIONWIDE);
}

#[test]
fn category_takes_the_first_matching_group() {
    assert_eq!(category("예비창업자 실전 교육 프로그램"), "교육");
    assert_eq!(category("수출기업 해외 마케팅 지원"), "글로벌·수출");
    assert_eq!(category("소상공인 판로개척 지원"), "판로·마케팅");
    assert_eq!(category("창업기업 정책자금 융자"), "자금·금융");
}

#[test]
fn category_defaults_when_no_keyword_matches() {
    assert_eq!(category("청년창업 지원사업 공고"), DEFAULT_CATEGORY);
    assert_eq!(category(""), DEFAULT_CATEGORY);
}

#[test]
fn target_audiences_are_flagged() {
    assert!(is_target("청년창업 지원사업"));
    assert!(is_target("소상공인 경영환경 개선"));
    assert!(is_target("1인 미디어 창작자 지원"));
    assert!(is_target("초기창업패키지 모집"));
    assert!(!is_target("중견기업 스마트공장 지원"));
}
