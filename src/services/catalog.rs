use std::collections::HashMap;

use crate::{
    errors::AppError,
    models::{
        course::{Course, CourseFilter, RatingStats},
        subject::Subject,
        user::User,
    },
    schema::{
        course::{
            CourseCard, CourseDetail, CoursePage, ModuleWithLessons, PageRequest, Pagination,
            ReviewWithUser,
        },
        Ratings, SubjectSummary, UserSummary,
    },
    store::Store,
};

fn ratings_by_course(stats: Vec<RatingStats>) -> HashMap<i64, Ratings> {
    stats
        .into_iter()
        .map(|s| {
            (
                s.course_id,
                Ratings {
                    average: s.average,
                    count: s.count,
                },
            )
        })
        .collect()
}

fn unique_ids(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut ids: Vec<i64> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub async fn subjects(store: &dyn Store) -> Result<Vec<Subject>, AppError> {
    Ok(store.list_subjects().await?)
}

/// One page of the catalog with instructor, subject and rating summaries.
pub async fn browse(
    store: &dyn Store,
    filter: CourseFilter,
    page: PageRequest,
) -> Result<CoursePage, AppError> {
    let total_courses = store.count_courses(&filter).await?;
    let courses = store.list_courses(&filter, page.window()).await?;

    let instructor_ids = unique_ids(courses.iter().map(|c| c.instructor_id));
    let subject_ids = unique_ids(courses.iter().map(|c| c.subject_id));
    let course_ids: Vec<i64> = courses.iter().map(|c| c.id).collect();

    let instructors: HashMap<i64, User> = store
        .users_by_ids(&instructor_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let subjects: HashMap<i64, Subject> = store
        .subjects_by_ids(&subject_ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let ratings = ratings_by_course(store.rating_stats(&course_ids).await?);

    let courses = courses
        .into_iter()
        .map(|course: Course| CourseCard {
            instructor: instructors.get(&course.instructor_id).map(UserSummary::of),
            subject: subjects.get(&course.subject_id).map(SubjectSummary::from),
            ratings: ratings.get(&course.id).copied().unwrap_or_default(),
            course,
        })
        .collect();

    Ok(CoursePage {
        courses,
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            total_courses,
            total_pages: page.total_pages(total_courses),
        },
    })
}

/// Full course page: outline, ratings and reviews with their authors.
pub async fn course_detail(store: &dyn Store, course_id: i64) -> Result<CourseDetail, AppError> {
    let course = store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    let subject = store.find_subject(course.subject_id).await?;
    let instructor = store.find_user(course.instructor_id).await?;

    let modules = store.course_modules(course.id).await?;
    let module_ids: Vec<i64> = modules.iter().map(|m| m.id).collect();
    let mut lessons_by_module: HashMap<i64, Vec<_>> = HashMap::new();
    for lesson in store.module_lessons(&module_ids).await? {
        lessons_by_module.entry(lesson.module_id).or_default().push(lesson);
    }
    let modules = modules
        .into_iter()
        .map(|module| ModuleWithLessons {
            lessons: lessons_by_module.remove(&module.id).unwrap_or_default(),
            module,
        })
        .collect();

    let ratings = ratings_by_course(store.rating_stats(&[course.id]).await?)
        .remove(&course.id)
        .unwrap_or_default();

    let reviews = store.course_reviews(course.id).await?;
    let reviewers: HashMap<i64, User> = store
        .users_by_ids(&unique_ids(reviews.iter().map(|r| r.user_id)))
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let reviews = reviews
        .into_iter()
        .map(|review| ReviewWithUser {
            user: reviewers.get(&review.user_id).map(UserSummary::of),
            review,
        })
        .collect();

    Ok(CourseDetail {
        instructor: instructor.as_ref().map(UserSummary::with_bio),
        subject,
        modules,
        ratings,
        reviews,
        course,
    })
}
